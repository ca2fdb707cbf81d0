//! Shared string table (`xl/sharedStrings.xml`).

use log::warn;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{FieldAuditError, Result};

/// Ordered, index-addressable shared strings.
///
/// Lookups are lenient: an index outside the table yields an empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SharedStringTable {
    items: Vec<String>,
}

impl SharedStringTable {
    /// Decode the shared-strings part. An absent part is an empty table.
    pub fn load(xml: Option<&[u8]>) -> Result<Self> {
        match xml {
            Some(xml) => Self::parse(xml),
            None => Ok(Self::default()),
        }
    }

    /// Parse `sst` XML. Each `si` item is the concatenation of its `t` runs,
    /// excluding phonetic (`rPh`) runs.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        // Whitespace inside <t> is significant.
        reader.config_mut().trim_text(false);

        let mut items = Vec::new();
        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut phonetic_depth = 0u32;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"t" => in_t = true,
                    b"rPh" => phonetic_depth += 1,
                    _ => {}
                },
                Ok(Event::Empty(e)) => {
                    // <si/> is an empty string item.
                    if e.local_name().as_ref() == b"si" {
                        items.push(String::new());
                    }
                }
                Ok(Event::Text(e)) => {
                    if in_si && in_t && phonetic_depth == 0 {
                        let text = e
                            .unescape()
                            .map_err(|e| FieldAuditError::parse("sharedStrings.xml", e))?;
                        current.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if in_si && in_t && phonetic_depth == 0 {
                        current.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        items.push(std::mem::take(&mut current));
                        in_si = false;
                    }
                    b"t" => in_t = false,
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(FieldAuditError::parse("sharedStrings.xml", e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(SharedStringTable { items })
    }

    /// String at `index`, or `""` if the index is out of range.
    pub fn get(&self, index: usize) -> &str {
        match self.items.get(index) {
            Some(s) => s.as_str(),
            None => {
                warn!(
                    "shared string index {} out of range (table has {} entries)",
                    index,
                    self.items.len()
                );
                ""
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<String>> for SharedStringTable {
    fn from(items: Vec<String>) -> Self {
        SharedStringTable { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_part_is_empty() {
        let table = SharedStringTable::load(None).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.get(0), "");
    }

    #[test]
    fn test_plain_and_rich_items() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>Field</t></si>
  <si><r><rPr><b/></rPr><t>Bold</t></r><r><t xml:space="preserve"> and plain</t></r></si>
  <si><t>A &amp; B &lt;c&gt;</t></si>
</sst>"#;
        let table = SharedStringTable::parse(xml.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), "Field");
        assert_eq!(table.get(1), "Bold and plain");
        assert_eq!(table.get(2), "A & B <c>");
    }

    #[test]
    fn test_out_of_range_is_empty_string() {
        let table = SharedStringTable::from(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(table.get(5), "");
        assert_eq!(table.get(2), "c");
    }

    #[test]
    fn test_prefixed_namespace_and_phonetic_runs() {
        let xml = r#"<x:sst xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<x:si><x:t>東京</x:t><x:rPh sb="0" eb="2"><x:t>トウキョウ</x:t></x:rPh></x:si>
<x:si/>
<x:si><x:t/></x:si>
</x:sst>"#;
        let table = SharedStringTable::parse(xml.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), "東京");
        assert_eq!(table.get(1), "");
        assert_eq!(table.get(2), "");
    }

    #[test]
    fn test_malformed_xml_errors() {
        let xml = b"<sst><si><t>open</si></sst>";
        assert!(matches!(SharedStringTable::parse(xml), Err(FieldAuditError::Parse(_))));
    }
}
