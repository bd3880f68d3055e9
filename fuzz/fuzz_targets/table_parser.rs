#![no_main]

use informe::table::{Column, ResultTable};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Convert arbitrary bytes to UTF-8 string (non-UTF-8 inputs are skipped)
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing must return an error for malformed tables, never panic
        let _ = ResultTable::parse_csv(input, &[Column::Detector], Path::new("fuzz"));
    }
});
