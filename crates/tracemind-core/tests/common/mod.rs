//! Shared test helpers for integration tests.

use std::path::{Path, PathBuf};

use tracemind_core::ast::{SourceFile, TreeSitterProvider};
use tracemind_core::config::StackTrace;
use tracemind_core::languages::parse_stack_trace;

// ---------------------------------------------------------------------------
// Fixture path resolution
// ---------------------------------------------------------------------------

/// Resolve `tests/fixtures/{name}` relative to the workspace root.
pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .join("../../tests/fixtures")
        .join(name)
        .canonicalize()
        .unwrap_or_else(|_| {
            Path::new(manifest_dir)
                .join("../../tests/fixtures")
                .join(name)
        })
}

/// Read a fixture file as text.
pub fn read_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// Parse helpers
// ---------------------------------------------------------------------------

/// Parse a trace fixture, panicking on failure.
pub fn parse_fixture_trace(name: &str) -> StackTrace {
    parse_stack_trace(&read_fixture(name)).expect("fixture trace should parse")
}

/// Load and parse a fixture source file with the tree-sitter grammars.
pub fn load_source(name: &str) -> SourceFile {
    let provider = TreeSitterProvider::new();
    SourceFile::load(&fixture_path(name), &provider, 1_000_000).expect("fixture source should parse")
}

/// Rewrite `path` so it is absolute under the fixture directory `app`.
pub fn absolute_in(app: &str, path: &str) -> String {
    fixture_path(app).join(path).display().to_string()
}
