//! # fieldaudit-core
//!
//! A minimal reader and writer for xlsx packages, and the field governance
//! audit built on it.
//!
//! The read path opens a package, resolves a sheet by name through the
//! workbook manifest and its relationships, decodes shared strings and turns
//! the worksheet into a [`Table`] keyed by its header row. The write path
//! emits a single-sheet package with a frozen header row and bounded column
//! widths, every value an inline string.
//!
//! ```no_run
//! use fieldaudit_core::{read_table, save_table, CompressionLevel, Package};
//!
//! let package = Package::open("fields.xlsx").unwrap();
//! let table = read_table(&package, Some("Fields")).unwrap();
//! save_table("copy.xlsx", "Fields", &table, CompressionLevel::Default).unwrap();
//! ```

pub mod audit;
pub mod codec;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod package;
pub mod relationships;
pub mod shared_strings;
pub mod table;
pub mod utils;
pub mod workbook;
pub mod worksheet;
pub mod writer;

pub use audit::{
    annotate, classify_data_category, classify_pii_level, recommended_action, run_audit, Action,
    AuditSummary, DataCategory, PiiLevel,
};
pub use codec::{Backend, MinimalCodec, SpreadsheetCodec};
#[cfg(feature = "library-backend")]
pub use codec::LibraryCodec;
pub use config::AuditConfig;
pub use error::{FieldAuditError, Result};
pub use package::Package;
pub use shared_strings::SharedStringTable;
pub use table::{Record, Table};
pub use utils::{column_to_letters, decode, encode};
pub use workbook::{resolve_sheet, ResolvedSheet, SheetEntry, WorkbookManifest};
pub use worksheet::{read_rows, read_table, rows_to_table, CellKind, SheetRow};
pub use writer::{column_widths, save_table, write_package, write_package_to_bytes, CompressionLevel};
