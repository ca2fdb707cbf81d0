#![no_main]

//! Individual part parsers on arbitrary XML: errors are fine, panics are not.

use fieldaudit_core::relationships::RelationshipMap;
use fieldaudit_core::workbook::parse_workbook_xml;
use fieldaudit_core::{read_rows, rows_to_table, SharedStringTable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 256 * 1024 {
        return;
    }

    let _ = parse_workbook_xml(data);
    let _ = RelationshipMap::parse("xl/workbook.xml", data);

    let strings = SharedStringTable::parse(data).unwrap_or_default();
    if let Ok(rows) = read_rows(data, &strings) {
        if let Ok(table) = rows_to_table(&rows, "fuzz") {
            for row in table.rows() {
                assert_eq!(row.len(), table.headers().len());
            }
        }
    }
});
