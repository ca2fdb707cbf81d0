//! Audit configuration, built once at the process boundary.

use std::path::PathBuf;

use crate::writer::CompressionLevel;

/// Inputs, outputs and column names for one audit run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditConfig {
    /// Workbook holding the fields to audit.
    pub source_path: PathBuf,
    /// Sheet of `source_path` to read.
    pub source_sheet: String,
    /// Workbook holding the data index.
    pub index_path: PathBuf,
    /// Sheet of `index_path` to read. `None` reads the first sheet.
    pub index_sheet: Option<String>,
    /// Destination workbook.
    pub output_path: PathBuf,
    /// Name of the single sheet written.
    pub output_sheet: String,
    /// Column of the source sheet holding field names.
    pub api_column: String,
    /// Column of the data index holding known names.
    pub index_column: String,
    /// Compression for the written package.
    pub compression: CompressionLevel,
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            source_path: PathBuf::from("John - Customer.io Use Cases - Copy.xlsx"),
            source_sheet: "HC TR ContactCandidate Fields".to_string(),
            index_path: PathBuf::from("DATA INDEX - Attributes.xlsx"),
            index_sheet: None,
            output_path: PathBuf::from("HC_TR_Full_Governance_Audit.xlsx"),
            output_sheet: "Governance Audit".to_string(),
            api_column: "Field Analysis: Field Name".to_string(),
            index_column: "Name".to_string(),
            compression: CompressionLevel::Default,
        }
    }
}

impl AuditConfig {
    /// Create a config with the default paths and names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source workbook and sheet.
    pub fn with_source(mut self, path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        self.source_path = path.into();
        self.source_sheet = sheet.into();
        self
    }

    /// Set the data index workbook; `sheet = None` reads its first sheet.
    pub fn with_index(mut self, path: impl Into<PathBuf>, sheet: Option<String>) -> Self {
        self.index_path = path.into();
        self.index_sheet = sheet;
        self
    }

    /// Set the output workbook and sheet name.
    pub fn with_output(mut self, path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        self.output_path = path.into();
        self.output_sheet = sheet.into();
        self
    }

    /// Set the field-name column of the source sheet.
    pub fn with_api_column(mut self, column: impl Into<String>) -> Self {
        self.api_column = column.into();
        self
    }

    /// Set the name column of the data index.
    pub fn with_index_column(mut self, column: impl Into<String>) -> Self {
        self.index_column = column.into();
        self
    }

    pub fn with_compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }
}
