//! Ordered-schema table: a fixed header sequence plus rows that carry exactly
//! one value per header.

use crate::error::{FieldAuditError, Result};

/// A header row and the rows beneath it, all values textual.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A borrowed view of one row, addressable by header name.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl Table {
    /// Create an empty table with the given headers.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (the header is not counted).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; it must have exactly one value per header.
    pub fn push_row(&mut self, values: Vec<String>) -> Result<()> {
        if values.len() != self.headers.len() {
            return Err(FieldAuditError::RowShape {
                expected: self.headers.len(),
                found: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    /// Position of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of `name`, or `MissingColumn` naming `source_name`.
    pub fn require_column(&self, name: &str, source_name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| FieldAuditError::MissingColumn {
                column: name.to_string(),
                source_name: source_name.to_string(),
            })
    }

    /// Value of column `name` in row `row`.
    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column_index(name)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// All values of the column at `col`, in row order.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[col].as_str())
    }

    /// Replace the values of column `name`, or append it as a new last column.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(FieldAuditError::RowShape {
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        match self.column_index(name) {
            Some(col) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[col] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Borrowed view of row `row`.
    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        self.rows.get(row).map(|values| Record {
            headers: &self.headers,
            values,
        })
    }

    /// Iterate rows as records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(move |values| Record {
            headers: &self.headers,
            values,
        })
    }
}

impl<'a> Record<'a> {
    /// Value under header `name`.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| self.values[i].as_str())
    }

    /// (header, value) pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn values(&self) -> &'a [String] {
        self.values
    }
}
