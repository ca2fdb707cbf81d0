//! Field classification and the governance audit pipeline.

#[cfg(feature = "fast-hash")]
use hashbrown::HashSet;
#[cfg(not(feature = "fast-hash"))]
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use log::info;

use crate::codec::SpreadsheetCodec;
use crate::config::AuditConfig;
use crate::error::{FieldAuditError, Result};
use crate::table::Table;

/// Columns appended by [`annotate`], in order.
pub const EXISTS_COLUMN: &str = "Exists in C.IO Data Index (Y/N)";
pub const CATEGORY_COLUMN: &str = "Data Category";
pub const PII_COLUMN: &str = "PII Level";
pub const ACTION_COLUMN: &str = "Recommended Action";

/// Data category of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataCategory {
    Sensitive,
    Operational,
    Marketing,
    System,
    Evaluate,
}

/// Personally identifiable information level of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PiiLevel {
    Restricted,
    High,
    Moderate,
    None,
}

/// What to do with a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Remove,
    Keep,
    Evaluate,
}

impl DataCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DataCategory::Sensitive => "Sensitive",
            DataCategory::Operational => "Operational",
            DataCategory::Marketing => "Marketing",
            DataCategory::System => "System",
            DataCategory::Evaluate => "Evaluate",
        }
    }
}

impl PiiLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PiiLevel::Restricted => "Restricted",
            PiiLevel::High => "High",
            PiiLevel::Moderate => "Moderate",
            PiiLevel::None => "None",
        }
    }
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Remove => "Remove",
            Action::Keep => "Keep",
            Action::Evaluate => "Evaluate",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PiiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn contains_any(value: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| value.contains(t))
}

/// Classify a field name by substring tokens; first matching rule wins.
pub fn classify_data_category(field_name: &str) -> DataCategory {
    let value = field_name.to_lowercase();
    if contains_any(&value, &["ssn", "bank", "routing", "tax"]) {
        DataCategory::Sensitive
    } else if contains_any(&value, &["resume", "employment", "cover"]) {
        DataCategory::Operational
    } else if contains_any(&value, &["status", "unit", "segment", "specialty", "vertical"]) {
        DataCategory::Marketing
    } else if contains_any(&value, &["id", "index"]) {
        DataCategory::System
    } else {
        DataCategory::Evaluate
    }
}

/// Classify a field name's PII level.
pub fn classify_pii_level(field_name: &str) -> PiiLevel {
    let value = field_name.to_lowercase();
    if value.contains("ssn") {
        PiiLevel::Restricted
    } else if contains_any(&value, &["email", "phone", "address", "birth"]) {
        PiiLevel::High
    } else if value.contains("name") {
        PiiLevel::Moderate
    } else {
        PiiLevel::None
    }
}

/// Recommend an action from index membership and category.
pub fn recommended_action(exists: bool, category: DataCategory) -> Action {
    if !exists {
        return Action::Remove;
    }
    match category {
        DataCategory::Sensitive => Action::Remove,
        DataCategory::Marketing => Action::Keep,
        _ => Action::Evaluate,
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Append the four audit columns to `source`.
///
/// A column already named like an audit column is overwritten in place.
pub fn annotate(mut source: Table, index: &Table, config: &AuditConfig) -> Result<Table> {
    let api_col = source.require_column(&config.api_column, &config.source_path.display().to_string())?;
    let index_col = index.require_column(&config.index_column, &config.index_path.display().to_string())?;

    let known: HashSet<String> = index.column(index_col).map(normalize).collect();

    let mut exists = Vec::with_capacity(source.len());
    let mut categories = Vec::with_capacity(source.len());
    let mut pii = Vec::with_capacity(source.len());
    let mut actions = Vec::with_capacity(source.len());

    for field in source.column(api_col) {
        let found = known.contains(&normalize(field));
        let category = classify_data_category(field);
        exists.push(if found { "Y" } else { "N" }.to_string());
        categories.push(category.to_string());
        pii.push(classify_pii_level(field).to_string());
        actions.push(recommended_action(found, category).to_string());
    }

    source.set_column(EXISTS_COLUMN, exists)?;
    source.set_column(CATEGORY_COLUMN, categories)?;
    source.set_column(PII_COLUMN, pii)?;
    source.set_column(ACTION_COLUMN, actions)?;
    Ok(source)
}

/// Outcome of one audit run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditSummary {
    pub output_path: PathBuf,
    pub rows: usize,
    pub keep: usize,
    pub remove: usize,
    pub evaluate: usize,
}

impl AuditSummary {
    fn from_table(output_path: PathBuf, table: &Table) -> Self {
        let mut summary = AuditSummary {
            output_path,
            rows: table.len(),
            keep: 0,
            remove: 0,
            evaluate: 0,
        };
        if let Some(col) = table.column_index(ACTION_COLUMN) {
            for action in table.column(col) {
                match action {
                    "Keep" => summary.keep += 1,
                    "Remove" => summary.remove += 1,
                    _ => summary.evaluate += 1,
                }
            }
        }
        summary
    }
}

/// Read both inputs, annotate, and write the audit workbook.
pub fn run_audit(codec: &dyn SpreadsheetCodec, config: &AuditConfig) -> Result<AuditSummary> {
    for path in [&config.source_path, &config.index_path] {
        if !path.exists() {
            return Err(FieldAuditError::FileNotFound(path.clone()));
        }
    }

    info!("auditing {} with the {} codec", config.source_path.display(), codec.name());
    let source = codec.read_table(&config.source_path, Some(&config.source_sheet))?;
    let index = codec.read_table(&config.index_path, config.index_sheet.as_deref())?;

    let audited = annotate(source, &index, config)?;
    codec.write_table(&config.output_path, &config.output_sheet, &audited)?;

    let summary = AuditSummary::from_table(config.output_path.clone(), &audited);
    info!(
        "{} field(s): {} keep, {} remove, {} evaluate",
        summary.rows, summary.keep, summary.remove, summary.evaluate
    );
    Ok(summary)
}
