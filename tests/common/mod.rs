//! Shared helpers for the integration tests.
// Each test binary uses a subset of these.
#![allow(dead_code)]

use logsim::Session;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes a circuit definition to a real temp file, for tests that
/// exercise the file-loading path or the binary.
pub fn circuit_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp circuit file");
    file.write_all(contents.as_bytes())
        .expect("write circuit file");
    file.flush().expect("flush circuit file");
    file
}

/// Parses in-memory source into a ready session, panicking on any
/// definition error.
pub fn session(src: &str) -> Session {
    Session::load_source(Path::new("test.circuit"), src)
        .expect("no fatal errors")
        .expect("clean parse")
}
