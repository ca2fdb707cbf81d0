//! Interchangeable spreadsheet codecs.
//!
//! [`MinimalCodec`] is the self-contained package reader/writer in this
//! crate. [`LibraryCodec`] (feature `library-backend`) delegates to calamine
//! and rust_xlsxwriter.

use std::path::Path;

use log::info;

use crate::error::Result;
use crate::package::Package;
use crate::table::Table;
use crate::worksheet::read_table;
use crate::writer::{save_table, CompressionLevel};

/// Reads one sheet into a [`Table`] and writes a [`Table`] as a one-sheet workbook.
pub trait SpreadsheetCodec {
    /// Short name used in logs and CLI selection.
    fn name(&self) -> &'static str;

    /// Read `sheet` (or the first sheet when `None`) of the workbook at `path`.
    fn read_table(&self, path: &Path, sheet: Option<&str>) -> Result<Table>;

    /// Write `table` to `path` as a workbook with one sheet named `sheet_name`,
    /// header row frozen.
    fn write_table(&self, path: &Path, sheet_name: &str, table: &Table) -> Result<()>;
}

/// The built-in package codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinimalCodec {
    pub compression: CompressionLevel,
}

impl MinimalCodec {
    pub fn new(compression: CompressionLevel) -> Self {
        MinimalCodec { compression }
    }
}

impl SpreadsheetCodec for MinimalCodec {
    fn name(&self) -> &'static str {
        "minimal"
    }

    fn read_table(&self, path: &Path, sheet: Option<&str>) -> Result<Table> {
        let package = Package::open(path)?;
        let table = read_table(&package, sheet)?;
        info!("read {} row(s) from {}", table.len(), path.display());
        Ok(table)
    }

    fn write_table(&self, path: &Path, sheet_name: &str, table: &Table) -> Result<()> {
        save_table(path, sheet_name, table, self.compression)
    }
}

/// Codec selection by name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Minimal,
    Library,
}

impl Backend {
    /// Build the codec for this backend.
    pub fn codec(self, compression: CompressionLevel) -> Result<Box<dyn SpreadsheetCodec>> {
        match self {
            Backend::Minimal => Ok(Box::new(MinimalCodec::new(compression))),
            #[cfg(feature = "library-backend")]
            Backend::Library => Ok(Box::new(LibraryCodec)),
            #[cfg(not(feature = "library-backend"))]
            Backend::Library => Err(crate::error::FieldAuditError::BackendUnavailable(
                "library".to_string(),
            )),
        }
    }
}

#[cfg(feature = "library-backend")]
pub use library::LibraryCodec;

#[cfg(feature = "library-backend")]
mod library {
    use std::path::Path;

    use calamine::{open_workbook_auto, DataType, Reader};
    use log::info;
    use rust_xlsxwriter::{Workbook, XlsxError};

    use super::SpreadsheetCodec;
    use crate::error::{FieldAuditError, Result};
    use crate::fsutil::replace_file;
    use crate::table::Table;
    use crate::worksheet::{rows_to_table, SheetRow};
    use crate::writer::column_widths;

    /// Codec backed by calamine (read) and rust_xlsxwriter (write).
    #[derive(Clone, Copy, Debug, Default)]
    pub struct LibraryCodec;

    fn library_error(path: &Path, err: impl std::fmt::Display) -> FieldAuditError {
        FieldAuditError::Parse(format!("{}: {}", path.display(), err))
    }

    impl SpreadsheetCodec for LibraryCodec {
        fn name(&self) -> &'static str {
            "library"
        }

        fn read_table(&self, path: &Path, sheet: Option<&str>) -> Result<Table> {
            if !path.exists() {
                return Err(FieldAuditError::FileNotFound(path.to_path_buf()));
            }
            let mut workbook = open_workbook_auto(path).map_err(|e| library_error(path, e))?;
            let names = workbook.sheet_names();
            let chosen = match sheet {
                Some(wanted) => names
                    .iter()
                    .find(|n| n.as_str() == wanted)
                    .or_else(|| {
                        let wanted = wanted.trim().to_lowercase();
                        names.iter().find(|n| n.trim().to_lowercase() == wanted)
                    })
                    .cloned()
                    .ok_or_else(|| FieldAuditError::SheetNotFound {
                        requested: wanted.to_string(),
                        available: names.clone(),
                    })?,
                None => names.first().cloned().ok_or_else(|| FieldAuditError::SheetNotFound {
                    requested: "<first sheet>".to_string(),
                    available: Vec::new(),
                })?,
            };

            let range = workbook
                .worksheet_range(&chosen)
                .map_err(|e| library_error(path, e))?;
            let (start_row, start_col) = range.start().unwrap_or((0, 0));
            let rows: Vec<SheetRow> = range
                .rows()
                .enumerate()
                .map(|(i, cells)| SheetRow {
                    index: start_row + i as u32 + 1,
                    cells: cells
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| !c.is_empty())
                        .map(|(j, c)| (start_col + j as u32 + 1, c.to_string()))
                        .collect(),
                })
                .collect();

            let table = rows_to_table(&rows, &chosen)?;
            info!("read {} row(s) from {}", table.len(), path.display());
            Ok(table)
        }

        fn write_table(&self, path: &Path, sheet_name: &str, table: &Table) -> Result<()> {
            let bytes = render(sheet_name, table).map_err(|e| library_error(path, e).writing(path))?;
            replace_file(path, |file| {
                use std::io::Write;
                Ok(file.write_all(&bytes)?)
            })?;
            info!("wrote {} row(s) to {} [{}]", table.len(), path.display(), sheet_name);
            Ok(())
        }
    }

    fn render(sheet_name: &str, table: &Table) -> std::result::Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;

        for (col, header) in table.headers().iter().enumerate() {
            worksheet.write_string(0, col as u16, header.as_str())?;
        }
        for (row, values) in table.rows().iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                worksheet.write_string(row as u32 + 1, col as u16, value.as_str())?;
            }
        }
        worksheet.set_freeze_panes(1, 0)?;
        for (col, width) in column_widths(table).into_iter().enumerate() {
            worksheet.set_column_width(col as u16, width as f64)?;
        }

        workbook.save_to_buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldAuditError;

    #[test]
    fn test_minimal_codec_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.xlsx");
        let mut table = Table::new(["Field", "Note"]);
        table.push_row(vec!["email".into(), "a & b".into()]).unwrap();

        let codec = MinimalCodec::default();
        codec.write_table(&path, "Out", &table).unwrap();
        assert_eq!(codec.read_table(&path, Some("out")).unwrap(), table);
        assert_eq!(codec.read_table(&path, None).unwrap(), table);
    }

    #[test]
    fn test_minimal_codec_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.xlsx");
        assert!(matches!(
            MinimalCodec::default().read_table(&path, None),
            Err(FieldAuditError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_backend_selection() {
        assert_eq!(Backend::Minimal.codec(CompressionLevel::Fast).unwrap().name(), "minimal");
        #[cfg(not(feature = "library-backend"))]
        assert!(matches!(
            Backend::Library.codec(CompressionLevel::Default),
            Err(FieldAuditError::BackendUnavailable(_))
        ));
        #[cfg(feature = "library-backend")]
        assert_eq!(Backend::Library.codec(CompressionLevel::Default).unwrap().name(), "library");
    }

    #[cfg(feature = "library-backend")]
    mod library_backend {
        use super::*;
        use crate::workbook::resolve_sheet;
        use std::io::{Cursor, Write};
        use zip::write::SimpleFileOptions;

        fn fields() -> Table {
            let mut table = Table::new(["Field Analysis: Field Name", "Owner", "Notes"]);
            table
                .push_row(vec!["candidate_status".into(), "ops".into(), "R&D <core>".into()])
                .unwrap();
            table.push_row(vec!["ssn".into(), String::new(), "30".into()]).unwrap();
            table.push_row(vec!["email".into(), "crm".into(), "Field 42".into()]).unwrap();
            table
        }

        #[test]
        fn test_minimal_write_library_read() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("minimal.xlsx");
            MinimalCodec::default().write_table(&path, "Governance Audit", &fields()).unwrap();

            let read = LibraryCodec.read_table(&path, Some("governance audit")).unwrap();
            assert_eq!(read, fields());
            assert_eq!(LibraryCodec.read_table(&path, None).unwrap(), fields());
        }

        #[test]
        fn test_library_write_minimal_read() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("library.xlsx");
            LibraryCodec.write_table(&path, "Governance Audit", &fields()).unwrap();

            let read = MinimalCodec::default().read_table(&path, Some("Governance Audit")).unwrap();
            assert_eq!(read, fields());

            let package = Package::open(&path).unwrap();
            let part = resolve_sheet(&package, Some("Governance Audit")).unwrap().part;
            let sheet = String::from_utf8(package.part(&part).unwrap().to_vec()).unwrap();
            assert!(sheet.contains(r#"ySplit="1""#));
            assert!(sheet.contains(r#"state="frozen""#));
            assert!(sheet.contains(r#"customWidth="1""#));
        }

        #[test]
        fn test_library_write_replaces_existing_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("out.xlsx");
            std::fs::write(&path, b"stale").unwrap();
            LibraryCodec.write_table(&path, "S", &fields()).unwrap();
            assert_eq!(&std::fs::read(&path).unwrap()[0..2], b"PK");
        }

        #[test]
        fn test_library_write_failure_leaves_no_file() {
            let dir = tempfile::tempdir().unwrap();
            let blocker = dir.path().join("blocker");
            std::fs::write(&blocker, b"x").unwrap();
            let path = blocker.join("out.xlsx");
            assert!(matches!(
                LibraryCodec.write_table(&path, "S", &fields()),
                Err(FieldAuditError::WriteFailure { .. })
            ));

            // Sheet names over 31 characters are rejected before anything is written.
            let path = dir.path().join("long.xlsx");
            assert!(matches!(
                LibraryCodec.write_table(&path, &"x".repeat(40), &fields()),
                Err(FieldAuditError::WriteFailure { .. })
            ));
            assert!(!path.exists());
        }

        #[test]
        fn test_library_read_offset_range_and_gaps() {
            let workbook = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Data Index" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
            let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;
            let root_rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
            let content_types = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;
            // Header starts at B2; column C is skipped in the data row.
            let sheet = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="B2:D3"/><sheetData>
<row r="2"><c r="B2" t="inlineStr"><is><t>Name</t></is></c><c r="C2" t="inlineStr"><is><t>Type</t></is></c><c r="D2" t="inlineStr"><is><t>Owner</t></is></c></row>
<row r="3"><c r="B3" t="inlineStr"><is><t>email</t></is></c><c r="D3" t="inlineStr"><is><t>crm</t></is></c></row>
</sheetData></worksheet>"#;

            let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
            for (name, body) in [
                ("[Content_Types].xml", content_types),
                ("_rels/.rels", root_rels),
                ("xl/workbook.xml", workbook),
                ("xl/_rels/workbook.xml.rels", rels),
                ("xl/worksheets/sheet1.xml", sheet),
            ] {
                zip.start_file(name, SimpleFileOptions::default()).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            let bytes = zip.finish().unwrap().into_inner();
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("index.xlsx");
            std::fs::write(&path, bytes).unwrap();

            let library = LibraryCodec.read_table(&path, Some("data index")).unwrap();
            let minimal = MinimalCodec::default().read_table(&path, Some("data index")).unwrap();
            assert_eq!(library.headers(), ["Name", "Type", "Owner"]);
            assert_eq!(library.rows(), [vec!["email".to_string(), String::new(), "crm".to_string()]]);
            assert_eq!(library, minimal);
        }

        #[test]
        fn test_library_read_errors() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("t.xlsx");
            assert!(matches!(
                LibraryCodec.read_table(&path, None),
                Err(FieldAuditError::FileNotFound(_))
            ));

            MinimalCodec::default().write_table(&path, "Fields", &fields()).unwrap();
            match LibraryCodec.read_table(&path, Some("Attributes")) {
                Err(FieldAuditError::SheetNotFound { requested, available }) => {
                    assert_eq!(requested, "Attributes");
                    assert_eq!(available, vec!["Fields"]);
                }
                other => panic!("expected SheetNotFound, got {:?}", other),
            }
        }
    }
}
