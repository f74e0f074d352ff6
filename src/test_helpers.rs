//! Shared test utilities for the course-redate test suite.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let report = process_tree(tmp.path(), &ScanConfig::default(), settings).unwrap();
//! assert_eq!(rewritten_paths(&report), vec!["wiki_content/unit-1-overview.html"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::process::TreeReport;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/course/` (an unpacked course package) to a temp directory.
///
/// Tests get an isolated copy they can rewrite without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    copy_dir_recursive(&fixtures_dir(), tmp.path()).unwrap();
    tmp
}

/// Location of the checked-in fixture course.
pub fn fixtures_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/course")
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// All fixture files as `(relative path, content)` pairs, sorted by path.
pub fn fixture_files() -> Vec<(String, String)> {
    let root = fixtures_dir();
    let mut files: Vec<(String, String)> = walkdir::WalkDir::new(&root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(&root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            let content = std::fs::read_to_string(e.path()).unwrap();
            (rel, content)
        })
        .collect();
    files.sort();
    files
}

// =========================================================================
// Lookups — panic with a clear message on miss
// =========================================================================

/// Read a file from a fixture copy. Panics if missing.
pub fn read_fixture_file(tmp: &TempDir, rel: &str) -> String {
    std::fs::read_to_string(tmp.path().join(rel))
        .unwrap_or_else(|e| panic!("fixture file '{rel}' unreadable: {e}"))
}

/// Paths of rewritten files in report order.
pub fn rewritten_paths(report: &TreeReport) -> Vec<&str> {
    report.rewritten().map(|f| f.path.as_str()).collect()
}
