//! Cell reference codec: `AB12` <-> (row 12, column 28).
//!
//! Column letters are a bijective base-26 numeral (A=1 .. Z=26, AA=27, ...),
//! rows are 1-based. Only the uppercase form written by spreadsheet producers
//! is accepted.

use crate::error::{FieldAuditError, Result};

/// Practical worksheet column limit (XFD).
pub const MAX_COLUMN: u32 = 16384;

/// Parse a cell reference from bytes into (row, column), both 1-indexed.
///
/// Returns `None` unless the input is exactly `[A-Z]+[1-9][0-9]*` and both
/// indices fit in a `u32`.
#[inline]
pub fn parse_reference_bytes(bytes: &[u8]) -> Option<(u32, u32)> {
    let split = bytes.iter().position(|b| !b.is_ascii_uppercase())?;
    if split == 0 {
        return None;
    }
    let (letters, digits) = bytes.split_at(split);
    if digits.first() == Some(&b'0') {
        return None;
    }

    let column = letters_to_column(letters)?;
    let row = parse_u32_bytes(digits)?;
    if row == 0 {
        return None;
    }
    Some((row, column))
}

/// Decode a cell reference (e.g. `"AB12"`) into (row, column).
pub fn decode(reference: &str) -> Result<(u32, u32)> {
    parse_reference_bytes(reference.as_bytes())
        .ok_or_else(|| FieldAuditError::MalformedReference(reference.to_string()))
}

/// Encode (row, column) as a cell reference.
pub fn encode(row: u32, column: u32) -> String {
    let mut out = column_to_letters(column);
    out.push_str(itoa::Buffer::new().format(row));
    out
}

/// Convert uppercase column letters to a 1-indexed column number.
#[inline]
fn letters_to_column(letters: &[u8]) -> Option<u32> {
    letters.iter().try_fold(0u32, |acc, &b| {
        acc.checked_mul(26)?.checked_add(u32::from(b - b'A') + 1)
    })
}

/// Convert column letters (e.g. `"AB"`) to a column number.
pub fn letters_to_column_number(letters: &str) -> Result<u32> {
    let bytes = letters.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_uppercase) {
        return Err(FieldAuditError::MalformedReference(letters.to_string()));
    }
    letters_to_column(bytes).ok_or_else(|| FieldAuditError::MalformedReference(letters.to_string()))
}

/// Convert a 1-indexed column number to letters (1 -> "A", 28 -> "AB").
pub fn column_to_letters(column: u32) -> String {
    let mut letters = Vec::with_capacity(4);
    let mut col = column;

    while col > 0 {
        col -= 1;
        letters.push(b'A' + (col % 26) as u8);
        col /= 26;
    }

    letters.reverse();
    // Only ASCII uppercase bytes were pushed.
    letters.into_iter().map(char::from).collect()
}

/// Parse a u32 directly from ASCII digits.
#[inline]
pub fn parse_u32_bytes(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }
    bytes.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}
