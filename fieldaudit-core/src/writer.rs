//! Package writer: a complete single-sheet package with a frozen header row.
//!
//! Every cell is written as an inline string, so no shared-string part is
//! produced and the worksheet is emitted in a single pass.

use std::io::{Cursor, Seek, Write};
use std::path::Path;

use log::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::fsutil::replace_file;
use crate::table::Table;
use crate::utils::{column_to_letters, encode};

/// Part holding the single written worksheet.
pub const WORKSHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Narrowest column width written, in character units.
pub const MIN_COLUMN_WIDTH: usize = 16;
/// Widest column width written, in character units.
pub const MAX_COLUMN_WIDTH: usize = 60;

const SPREADSHEETML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Compression level for written packages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Stored, no compression.
    None,
    /// Deflate level 1.
    Fast,
    /// Deflate level 6.
    #[default]
    Default,
    /// Deflate level 9.
    Best,
}

impl CompressionLevel {
    fn file_options(self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default().large_file(false);
        match self {
            CompressionLevel::None => options.compression_method(CompressionMethod::Stored),
            CompressionLevel::Fast => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(1)),
            CompressionLevel::Default => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(6)),
            CompressionLevel::Best => options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(9)),
        }
    }
}

/// Characters XML 1.0 cannot carry at all, even as references.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

fn escape_into(out: &mut String, s: &str, quotes: bool) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            c if is_xml_char(c) => out.push(c),
            _ => {}
        }
    }
}

/// Escape text content. Characters outside the XML 1.0 range are dropped.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_into(&mut out, s, false);
    out
}

/// Escape an attribute value (text escaping plus double quotes).
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_into(&mut out, s, true);
    out
}

/// Width of each column: the longest of header and values, plus 2,
/// bounded to `[MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH]`.
pub fn column_widths(table: &Table) -> Vec<usize> {
    table
        .headers()
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest = table
                .column(col)
                .map(|v| v.chars().count())
                .fold(header.chars().count(), usize::max);
            (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Write the package for `table` into `writer`.
pub fn write_package<W: Write + Seek>(
    writer: W,
    sheet_name: &str,
    table: &Table,
    compression: CompressionLevel,
) -> Result<W> {
    let options = compression.file_options();
    let mut zip = ZipWriter::new(writer);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(content_types_xml().as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(rels_xml().as_bytes())?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(workbook_xml(sheet_name).as_bytes())?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    zip.write_all(workbook_rels_xml().as_bytes())?;

    zip.start_file(WORKSHEET_PART, options)?;
    zip.write_all(worksheet_xml(table).as_bytes())?;

    zip.start_file("xl/styles.xml", options)?;
    zip.write_all(styles_xml().as_bytes())?;

    Ok(zip.finish()?)
}

/// Write the package for `table` to an in-memory byte vector.
pub fn write_package_to_bytes(
    sheet_name: &str,
    table: &Table,
    compression: CompressionLevel,
) -> Result<Vec<u8>> {
    let cursor = write_package(Cursor::new(Vec::new()), sheet_name, table, compression)?;
    Ok(cursor.into_inner())
}

/// Write the package for `table` to `path`, replacing it atomically.
///
/// On failure the destination is left untouched and the error is
/// `WriteFailure` naming the path.
pub fn save_table(
    path: impl AsRef<Path>,
    sheet_name: &str,
    table: &Table,
    compression: CompressionLevel,
) -> Result<()> {
    let path = path.as_ref();
    replace_file(path, |file| {
        write_package(file, sheet_name, table, compression).map(|_| ())
    })?;
    info!("wrote {} row(s) to {} [{}]", table.len(), path.display(), sheet_name);
    Ok(())
}

fn content_types_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>"#
}

fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>
<sheet name="{}" sheetId="1" r:id="rId1"/>
</sheets>
</workbook>"#,
        SPREADSHEETML_NS,
        escape_attr(sheet_name)
    )
}

fn workbook_rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#
}

fn styles_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="1"><fill><patternFill patternType="none"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#
}

fn worksheet_xml(table: &Table) -> String {
    let ncols = table.headers().len() as u32;
    let nrows = table.len() as u32 + 1;
    let widths = column_widths(table);

    let mut out = String::with_capacity(512 + 64 * (table.len() + 1) * widths.len().max(1));
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(&format!(r#"<worksheet xmlns="{}">"#, SPREADSHEETML_NS));
    out.push('\n');

    let dimension = if ncols == 0 {
        "A1".to_string()
    } else {
        format!("A1:{}", encode(nrows, ncols))
    };
    out.push_str(&format!(r#"<dimension ref="{}"/>"#, dimension));
    out.push('\n');

    // Header row stays visible: split below row 1 and freeze.
    out.push_str(concat!(
        r#"<sheetViews><sheetView tabSelected="1" workbookViewId="0">"#,
        r#"<pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/>"#,
        r#"<selection pane="bottomLeft" activeCell="A2" sqref="A2"/>"#,
        r#"</sheetView></sheetViews>"#
    ));
    out.push('\n');
    out.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);
    out.push('\n');

    if !widths.is_empty() {
        out.push_str("<cols>");
        for (i, width) in widths.iter().enumerate() {
            out.push_str(&format!(
                r#"<col min="{col}" max="{col}" width="{width}" customWidth="1"/>"#,
                col = i + 1
            ));
        }
        out.push_str("</cols>\n");
    }

    out.push_str("<sheetData>\n");
    write_row(&mut out, 1, table.headers());
    for (i, row) in table.rows().iter().enumerate() {
        write_row(&mut out, i as u32 + 2, row);
    }
    out.push_str("</sheetData>\n");
    out.push_str(r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#);
    out.push('\n');
    out.push_str("</worksheet>");
    out
}

fn write_row(out: &mut String, row: u32, values: &[String]) {
    let mut row_buf = itoa::Buffer::new();
    let row_num = row_buf.format(row);
    out.push_str("<row r=\"");
    out.push_str(row_num);
    out.push_str("\">");
    for (i, value) in values.iter().enumerate() {
        out.push_str("<c r=\"");
        out.push_str(&column_to_letters(i as u32 + 1));
        out.push_str(row_num);
        out.push_str("\" t=\"inlineStr\"><is><t");
        if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace) {
            out.push_str(" xml:space=\"preserve\"");
        }
        out.push('>');
        out.push_str(&escape_xml(value));
        out.push_str("</t></is></c>");
    }
    out.push_str("</row>\n");
}
