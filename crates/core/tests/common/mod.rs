//! Shared test helpers for `texfilter_core` integration tests.

#![allow(unreachable_pub)]

use std::path::Path;

use texfilter_core::{CommandTable, Segment, extract_segments};

/// Read a file from `tests/fixtures`.
#[allow(dead_code)]
pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

/// Segments of `source` against the built-in table.
#[allow(dead_code)]
pub fn segments(source: &str) -> Vec<Segment> {
    extract_segments(source, CommandTable::builtin())
        .unwrap_or_else(|e| panic!("extraction failed for {source:?}: {e}"))
}

/// Segment texts only.
#[allow(dead_code)]
pub fn segment_texts(source: &str) -> Vec<String> {
    segments(source).into_iter().map(|s| s.text).collect()
}
