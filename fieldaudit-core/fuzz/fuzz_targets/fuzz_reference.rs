#![no_main]

//! Cell reference decoding must never panic, and every reference it accepts
//! must encode back to the same text.

use arbitrary::Arbitrary;
use fieldaudit_core::{column_to_letters, decode, encode};
use fieldaudit_core::utils::letters_to_column_number;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct ReferenceInput {
    text: String,
    row: u32,
    column: u32,
}

fuzz_target!(|input: ReferenceInput| {
    if let Ok((row, col)) = decode(&input.text) {
        assert!(row >= 1 && col >= 1);
        assert_eq!(encode(row, col), input.text);
    }

    let (row, col) = (input.row.max(1), input.column.max(1));
    let reference = encode(row, col);
    assert_eq!(decode(&reference).ok(), Some((row, col)));

    let letters = column_to_letters(col);
    assert_eq!(letters_to_column_number(&letters).ok(), Some(col));
});
