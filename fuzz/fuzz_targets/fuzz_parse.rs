//! The scanner/parser pipeline must never panic, whatever bytes the
//! definition file contains. Diagnostics and rejection are fine.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = logsim::Session::load_source(Path::new("fuzz.circuit"), text);
    }
});
