//! Workbook manifest parsing and sheet resolution.

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{FieldAuditError, Result};
use crate::package::Package;
use crate::relationships::{
    rels_for_part, RelationshipMap, OFFICE_DOCUMENT_REL_TYPE, SHARED_STRINGS_REL_TYPE,
};

/// Conventional location of the workbook part.
pub const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
/// Conventional location of the shared string table.
pub const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// A sheet as declared in the workbook manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetEntry {
    /// Display name.
    pub name: String,
    /// Relationship id (`r:id`) linking to the worksheet part.
    pub rel_id: String,
}

/// A sheet whose worksheet part has been located.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSheet {
    pub name: String,
    pub part: String,
}

/// The workbook part and its relationships.
#[derive(Debug)]
pub struct WorkbookManifest {
    part: String,
    sheets: Vec<SheetEntry>,
    rels: RelationshipMap,
}

impl WorkbookManifest {
    /// Locate and parse the workbook part of a package.
    ///
    /// The part is found through the package relationships when present,
    /// otherwise at `xl/workbook.xml`.
    pub fn load(package: &Package) -> Result<Self> {
        let part = match package.part("_rels/.rels") {
            Some(xml) => RelationshipMap::parse("", xml)?
                .resolve_type(OFFICE_DOCUMENT_REL_TYPE)
                .filter(|p| package.contains(p))
                .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()),
            None => DEFAULT_WORKBOOK_PART.to_string(),
        };

        let sheets = parse_workbook_xml(package.require_part(&part)?)?;
        let rels_part = rels_for_part(&part);
        let rels = RelationshipMap::parse(&part, package.require_part(&rels_part)?)?;
        debug!("workbook {} declares {} sheet(s)", part, sheets.len());

        Ok(WorkbookManifest { part, sheets, rels })
    }

    /// Name of the workbook part.
    pub fn part(&self) -> &str {
        &self.part
    }

    /// Shared string part named by the workbook relationships, or
    /// `xl/sharedStrings.xml` when none is declared.
    pub fn shared_strings_part(&self) -> String {
        self.rels
            .resolve_type(SHARED_STRINGS_REL_TYPE)
            .unwrap_or_else(|| DEFAULT_SHARED_STRINGS_PART.to_string())
    }

    /// Declared sheets in declaration order.
    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    /// Declared sheet names in declaration order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Find a sheet by name: exact match first, then a trimmed,
    /// case-insensitive match. First match in declaration order wins.
    pub fn find_sheet(&self, name: &str) -> Option<&SheetEntry> {
        self.sheets.iter().find(|s| s.name == name).or_else(|| {
            let wanted = name.trim().to_lowercase();
            self.sheets
                .iter()
                .find(|s| s.name.trim().to_lowercase() == wanted)
        })
    }

    /// Resolve a sheet by name to its worksheet part.
    pub fn resolve(&self, name: &str) -> Result<ResolvedSheet> {
        let entry = self
            .find_sheet(name)
            .ok_or_else(|| FieldAuditError::SheetNotFound {
                requested: name.to_string(),
                available: self.sheet_names(),
            })?;
        self.resolve_entry(entry)
    }

    /// Resolve `name`, or the first declared sheet when `None`.
    pub fn resolve_opt(&self, name: Option<&str>) -> Result<ResolvedSheet> {
        match name {
            Some(name) => self.resolve(name),
            None => self.resolve_first(),
        }
    }

    /// Resolve the first declared sheet.
    pub fn resolve_first(&self) -> Result<ResolvedSheet> {
        let entry = self
            .sheets
            .first()
            .ok_or_else(|| FieldAuditError::SheetNotFound {
                requested: "<first sheet>".to_string(),
                available: Vec::new(),
            })?;
        self.resolve_entry(entry)
    }

    fn resolve_entry(&self, entry: &SheetEntry) -> Result<ResolvedSheet> {
        let part = self
            .rels
            .resolve(&entry.rel_id)
            .ok_or_else(|| FieldAuditError::MissingRelationship {
                sheet: entry.name.clone(),
                id: entry.rel_id.clone(),
            })?;
        debug!("sheet '{}' -> {}", entry.name, part);
        Ok(ResolvedSheet {
            name: entry.name.clone(),
            part,
        })
    }
}

/// Resolve `name` (or the first sheet when `None`) to its worksheet part.
pub fn resolve_sheet(package: &Package, name: Option<&str>) -> Result<ResolvedSheet> {
    WorkbookManifest::load(package)?.resolve_opt(name)
}

/// Parse the workbook part into its declared sheets.
pub fn parse_workbook_xml(xml: &[u8]) -> Result<Vec<SheetEntry>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut sheets = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    if let Some(entry) = sheet_entry(&e)? {
                        sheets.push(entry);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FieldAuditError::parse("workbook.xml", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

fn sheet_entry(e: &BytesStart) -> Result<Option<SheetEntry>> {
    let mut name: Option<String> = None;
    let mut rel_id: Option<String> = None;

    for attr in e.attributes().flatten() {
        let key = attr.key;
        // `name` is unqualified; the relationship id is `r:id` under whatever prefix.
        let is_rel_id = key.prefix().is_some() && key.local_name().as_ref() == b"id";
        if key.as_ref() == b"name" {
            name = Some(
                attr.unescape_value()
                    .map_err(|e| FieldAuditError::parse("workbook.xml", e))?
                    .into_owned(),
            );
        } else if is_rel_id {
            rel_id = Some(String::from_utf8_lossy(&attr.value).into_owned());
        }
    }

    Ok(match (name, rel_id) {
        (Some(name), Some(rel_id)) => Some(SheetEntry { name, rel_id }),
        _ => None,
    })
}
