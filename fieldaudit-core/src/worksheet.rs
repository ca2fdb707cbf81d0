//! Worksheet row materialization: worksheet XML -> sparse rows -> [`Table`].

use std::collections::BTreeMap;

#[cfg(feature = "fast-hash")]
use hashbrown::HashMap;
#[cfg(not(feature = "fast-hash"))]
use std::collections::HashMap;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{FieldAuditError, Result};
use crate::package::Package;
use crate::shared_strings::SharedStringTable;
use crate::table::Table;
use crate::utils::{decode, parse_u32_bytes};
use crate::workbook::WorkbookManifest;

/// How a cell stores its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    /// `t="s"`: `v` is an index into the shared string table.
    SharedString,
    /// `t="inlineStr"`: text lives in `is/t`.
    InlineString,
    /// Anything else: `v` is taken verbatim.
    Raw,
}

impl CellKind {
    fn from_type_attr(t: &[u8]) -> Self {
        match t {
            b"s" => CellKind::SharedString,
            b"inlineStr" => CellKind::InlineString,
            _ => CellKind::Raw,
        }
    }
}

/// One decoded row. Absent cells are absent from `cells`, not empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetRow {
    /// Row index declared by the enclosing `row` element.
    pub index: u32,
    /// Column index -> decoded text.
    pub cells: BTreeMap<u32, String>,
}

#[derive(Default)]
struct CellState {
    column: u32,
    kind: Option<CellKind>,
    raw: String,
    inline: String,
    has_value: bool,
}

/// Decode every `row`/`c` element of a worksheet part.
///
/// The enclosing row's index is authoritative; a cell reference naming a
/// different row is tolerated and logged.
pub fn read_rows(xml: &[u8], shared_strings: &SharedStringTable) -> Result<Vec<SheetRow>> {
    let mut reader = Reader::from_reader(xml);
    // Whitespace in values is significant.
    reader.config_mut().trim_text(false);

    let mut rows: Vec<SheetRow> = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<SheetRow> = None;
    let mut cell: Option<CellState> = None;
    let mut last_row = 0u32;
    let mut last_col = 0u32;
    let mut in_v = false;
    let mut in_is = false;
    let mut in_t = false;
    let mut phonetic_depth = 0u32;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    let index = row_index(&e, last_row)?;
                    last_row = index;
                    last_col = 0;
                    current = Some(SheetRow { index, cells: BTreeMap::new() });
                }
                b"c" => {
                    let state = start_cell(&e, last_row, last_col)?;
                    last_col = state.column;
                    cell = Some(state);
                }
                b"v" => in_v = true,
                b"is" => in_is = true,
                b"t" => in_t = true,
                b"rPh" => phonetic_depth += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    let index = row_index(&e, last_row)?;
                    last_row = index;
                    last_col = 0;
                    rows.push(SheetRow { index, cells: BTreeMap::new() });
                }
                b"c" => {
                    // A valueless cell still occupies its column.
                    let state = start_cell(&e, last_row, last_col)?;
                    last_col = state.column;
                    if let Some(row) = current.as_mut() {
                        row.cells.insert(state.column, String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(state) = cell.as_mut() {
                    if in_v || (in_is && in_t && phonetic_depth == 0) {
                        let text = e
                            .unescape()
                            .map_err(|e| FieldAuditError::parse("worksheet", e))?;
                        if in_v {
                            state.raw.push_str(&text);
                        } else {
                            state.inline.push_str(&text);
                        }
                        state.has_value = true;
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(state) = cell.as_mut() {
                    if in_v {
                        state.raw.push_str(&String::from_utf8_lossy(&e));
                    } else if in_is && in_t && phonetic_depth == 0 {
                        state.inline.push_str(&String::from_utf8_lossy(&e));
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"row" => {
                    if let Some(row) = current.take() {
                        rows.push(row);
                    }
                }
                b"c" => {
                    if let (Some(state), Some(row)) = (cell.take(), current.as_mut()) {
                        let column = state.column;
                        row.cells.insert(column, cell_text(state, shared_strings));
                    }
                }
                b"v" => in_v = false,
                b"is" => in_is = false,
                b"t" => in_t = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(FieldAuditError::parse("worksheet", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn row_index(e: &BytesStart, last_row: u32) -> Result<u32> {
    match e.attributes().flatten().find(|a| a.key.as_ref() == b"r") {
        Some(attr) => match parse_u32_bytes(&attr.value) {
            Some(index) if index > 0 => Ok(index),
            _ => Err(FieldAuditError::MalformedReference(
                String::from_utf8_lossy(&attr.value).into_owned(),
            )),
        },
        None => last_row
            .checked_add(1)
            .ok_or_else(|| FieldAuditError::parse("worksheet", "row index past u32::MAX")),
    }
}

fn start_cell(e: &BytesStart, row: u32, last_col: u32) -> Result<CellState> {
    let mut state = CellState::default();
    let mut located = false;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"r" => {
                located = true;
                let reference = String::from_utf8_lossy(&attr.value);
                let (ref_row, column) = decode(&reference)?;
                if ref_row != row {
                    warn!(
                        "cell {} sits in row element {}; using the row element's index",
                        reference, row
                    );
                }
                state.column = column;
            }
            b"t" => state.kind = Some(CellKind::from_type_attr(&attr.value)),
            _ => {}
        }
    }

    if !located {
        state.column = last_col
            .checked_add(1)
            .ok_or_else(|| FieldAuditError::parse("worksheet", "column index past u32::MAX"))?;
    }
    Ok(state)
}

fn cell_text(state: CellState, shared_strings: &SharedStringTable) -> String {
    match state.kind.unwrap_or(CellKind::Raw) {
        CellKind::SharedString => {
            if !state.has_value {
                return String::new();
            }
            match state.raw.trim().parse::<usize>() {
                Ok(idx) => shared_strings.get(idx).to_string(),
                Err(_) => {
                    warn!("shared string cell holds a non-index value {:?}", state.raw);
                    String::new()
                }
            }
        }
        CellKind::InlineString => state.inline,
        CellKind::Raw => state.raw,
    }
}

/// Turn decoded rows into a table: the first row is the header.
///
/// Header text is trimmed; blank header columns are dropped. Repeated names
/// get a `.N` suffix (`X`, `X.1`, `X.2`). Cells missing from a data row are
/// empty strings.
pub fn rows_to_table(rows: &[SheetRow], part: &str) -> Result<Table> {
    let (header_row, data_rows) = rows
        .split_first()
        .ok_or_else(|| FieldAuditError::EmptySheet(part.to_string()))?;

    let mut columns: Vec<u32> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (&col, text) in &header_row.cells {
        let name = text.trim();
        if name.is_empty() {
            continue;
        }
        let name = unique_header(name, &mut seen, &names);
        columns.push(col);
        names.push(name);
    }

    let mut table = Table::new(names);
    for row in data_rows {
        let values = columns
            .iter()
            .map(|col| row.cells.get(col).cloned().unwrap_or_default())
            .collect();
        table.push_row(values)?;
    }

    debug!("{}: {} column(s), {} data row(s)", part, table.headers().len(), table.len());
    Ok(table)
}

fn unique_header(name: &str, seen: &mut HashMap<String, usize>, taken: &[String]) -> String {
    let count = seen.entry(name.to_string()).or_insert(0);
    if *count == 0 {
        *count = 1;
        if !taken.iter().any(|t| t == name) {
            return name.to_string();
        }
    }
    loop {
        let candidate = format!("{}.{}", name, *count);
        *count += 1;
        if !taken.iter().any(|t| *t == candidate) {
            warn!("duplicate header '{}' renamed to '{}'", name, candidate);
            return candidate;
        }
    }
}

/// Read one sheet of a package into a table.
///
/// `sheet` selects by name (exact, then case-insensitive); `None` takes the
/// first declared sheet.
pub fn read_table(package: &Package, sheet: Option<&str>) -> Result<Table> {
    let manifest = WorkbookManifest::load(package)?;
    let resolved = manifest.resolve_opt(sheet)?;
    let shared_strings = SharedStringTable::load(package.part(&manifest.shared_strings_part()))?;
    let rows = read_rows(package.require_part(&resolved.part)?, &shared_strings)?;
    rows_to_table(&rows, &resolved.part)
}
