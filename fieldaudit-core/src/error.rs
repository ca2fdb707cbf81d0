//! Error types for fieldaudit-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using FieldAuditError.
pub type Result<T> = std::result::Result<T, FieldAuditError>;

/// Errors raised while reading, annotating, or writing workbooks.
#[derive(Debug, Error)]
pub enum FieldAuditError {
    /// An input file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A cell reference does not match `[A-Z]+[0-9]+`.
    #[error("malformed cell reference: {0:?}")]
    MalformedReference(String),

    /// No declared sheet matches the requested name.
    #[error("sheet '{requested}' not found (available: {})", .available.join(", "))]
    SheetNotFound {
        requested: String,
        available: Vec<String>,
    },

    /// A sheet's relationship id has no target in the workbook relationships.
    #[error("sheet '{sheet}' references relationship '{id}' which has no target")]
    MissingRelationship { sheet: String, id: String },

    /// A required part is absent from the package.
    #[error("package part not found: {0}")]
    MissingPart(String),

    /// The worksheet has no rows at all.
    #[error("worksheet '{0}' has no rows")]
    EmptySheet(String),

    /// A required column is absent from a table's header.
    #[error("missing required column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    /// A row's value count differs from the header count.
    #[error("row has {found} values but the table has {expected} columns")]
    RowShape { expected: usize, found: usize },

    /// The output package could not be written. The destination is untouched.
    #[error("failed to write '{}': {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: Box<FieldAuditError>,
    },

    /// XML content could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The requested codec was not compiled in.
    #[error("codec backend '{0}' is not available in this build")]
    BackendUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl FieldAuditError {
    /// Build a parse error for a named part.
    pub fn parse(part: &str, err: impl std::fmt::Display) -> Self {
        FieldAuditError::Parse(format!("{}: {}", part, err))
    }

    /// Wrap `self` as the cause of a failed write to `path`.
    pub fn writing(self, path: &std::path::Path) -> Self {
        match self {
            already @ FieldAuditError::WriteFailure { .. } => already,
            other => FieldAuditError::WriteFailure {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }
}
