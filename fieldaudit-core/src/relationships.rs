//! Part relationships (`*.rels`) and relationship target resolution.

#[cfg(feature = "fast-hash")]
use hashbrown::HashMap;
#[cfg(not(feature = "fast-hash"))]
use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{FieldAuditError, Result};

/// Package relationships namespace.
pub const PACKAGE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
/// Office document relationships namespace (also the `r:` prefix in parts).
pub const OFFICE_RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
/// Relationship type of the package's main document.
pub const OFFICE_DOCUMENT_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Relationship type of the workbook's shared string table.
pub const SHARED_STRINGS_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

/// A single relationship entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Relationships of one source part, resolvable by id.
#[derive(Clone, Debug, Default)]
pub struct RelationshipMap {
    source_part: String,
    entries: Vec<Relationship>,
    by_id: HashMap<String, usize>,
}

impl RelationshipMap {
    /// Parse the relationships part belonging to `source_part`.
    pub fn parse(source_part: &str, xml: &[u8]) -> Result<Self> {
        let entries = parse_relationships(xml)?;
        let mut by_id = HashMap::with_capacity(entries.len());
        for (idx, rel) in entries.iter().enumerate() {
            // First declaration wins on duplicate ids.
            by_id.entry(rel.id.clone()).or_insert(idx);
        }
        Ok(RelationshipMap {
            source_part: source_part.to_string(),
            entries,
            by_id,
        })
    }

    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    /// Resolve a relationship id to a package part name.
    pub fn resolve(&self, id: &str) -> Option<String> {
        self.get(id)
            .map(|rel| resolve_target(&self.source_part, &rel.target))
    }

    /// First relationship of the given type, resolved to a part name.
    pub fn resolve_type(&self, rel_type: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|rel| rel.rel_type == rel_type)
            .map(|rel| resolve_target(&self.source_part, &rel.target))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a `*.rels` part into its relationship entries, in document order.
pub fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut rels = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id: Option<String> = None;
                    let mut rel_type = String::new();
                    let mut target: Option<String> = None;

                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| FieldAuditError::parse("relationships", e))?;
                        match attr.key.local_name().as_ref() {
                            b"Id" => id = Some(value.into_owned()),
                            b"Type" => rel_type = value.into_owned(),
                            b"Target" => target = Some(value.into_owned()),
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target)) = (id, target) {
                        rels.push(Relationship { id, rel_type, target });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FieldAuditError::parse("relationships", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Name of the relationships part for `part` (`xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`).
pub fn rels_for_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    // Part names carry no fragment.
    let target = target.split('#').next().unwrap_or(target);
    if target.is_empty() {
        return normalize(source_part);
    }
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }

    let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(&format!("{base_dir}/{target}"))
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet5.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships(WORKBOOK_RELS.as_bytes()).unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(rels[0].id, "rId1");
        assert_eq!(rels[0].target, "worksheets/sheet1.xml");
        assert!(rels[2].rel_type.ends_with("/styles"));
    }

    #[test]
    fn test_relationship_map_resolves_relative_and_absolute() {
        let map = RelationshipMap::parse("xl/workbook.xml", WORKBOOK_RELS.as_bytes()).unwrap();
        assert_eq!(map.resolve("rId1").as_deref(), Some("xl/worksheets/sheet1.xml"));
        assert_eq!(map.resolve("rId2").as_deref(), Some("xl/worksheets/sheet5.xml"));
        assert_eq!(map.resolve("rId9"), None);
    }

    #[test]
    fn test_prefixed_relationships() {
        let xml = r#"<pr:Relationships xmlns:pr="http://schemas.openxmlformats.org/package/2006/relationships">
<pr:Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</pr:Relationships>"#;
        let map = RelationshipMap::parse("", xml.as_bytes()).unwrap();
        assert_eq!(map.resolve_type(OFFICE_DOCUMENT_REL_TYPE).as_deref(), Some("xl/workbook.xml"));
    }

    #[test]
    fn test_rels_for_part() {
        assert_eq!(rels_for_part("workbook.xml"), "_rels/workbook.xml.rels");
        assert_eq!(rels_for_part("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../media/image1.png"),
            "xl/media/image1.png"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml#rId1"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "/xl/../docProps/core.xml"),
            "docProps/core.xml"
        );
        assert_eq!(resolve_target("", "xl/workbook.xml"), "xl/workbook.xml");
    }
}
