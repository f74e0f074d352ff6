//! Directive resolution over an unpacked course tree.
//!
//! Walks every regular file under the root, picks the ones whose extension is
//! in [`ScanConfig::extensions`](crate::config::ScanConfig), and runs
//! [`apply_directives`] on each. A file is written back only when the scan saw
//! at least one `DateReplace(` marker.
//!
//! ## Failure Isolation
//!
//! Files are independent. A file that cannot be read or written is reported
//! as [`FileStatus::Failed`] and the rest of the tree is still processed; only
//! a failure to walk the tree itself aborts. Files that are not UTF-8 are
//! still scanned, one char per byte, and written back in their own encoding.
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel with [rayon](https://docs.rs/rayon). The
//! within-file scan is sequential, and results come back sorted by path.

use crate::config::ScanConfig;
use crate::date::CalendarDate;
use crate::directive::apply_directives;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk {0}: {1}")]
    Walk(PathBuf, #[source] walkdir::Error),
}

/// Inputs shared by every file in a run.
#[derive(Debug, Clone, Copy)]
pub struct DateSettings {
    pub base: CalendarDate,
    pub start_index: i64,
}

/// What happened to one candidate file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Markers found; the file was written back.
    Rewritten {
        markers: usize,
        replaced: usize,
        skipped: usize,
    },
    /// No markers; the file was not touched.
    Unchanged,
    /// Could not be read or written.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    /// Path relative to the processed root, `/`-separated.
    pub path: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Result of processing a whole tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeReport {
    /// Candidate files in path order.
    pub files: Vec<FileReport>,
    /// Files skipped because of their extension.
    pub ignored: usize,
}

impl TreeReport {
    pub fn rewritten(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Rewritten { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed { .. }))
    }

    /// Total target spans rewritten across all files.
    pub fn dates_replaced(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Rewritten { replaced, .. } => replaced,
                _ => 0,
            })
            .sum()
    }

    /// Total directives found but not applied.
    pub fn directives_skipped(&self) -> usize {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Rewritten { skipped, .. } => skipped,
                _ => 0,
            })
            .sum()
    }
}

/// Collect candidate files under `root`, sorted, plus the count of ignored
/// files.
pub fn collect_candidates(
    root: &Path,
    scan: &ScanConfig,
) -> Result<(Vec<PathBuf>, usize), ProcessError> {
    let mut candidates = Vec::new();
    let mut ignored = 0;

    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(|e| ProcessError::Walk(root.to_path_buf(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if scan.accepts(entry.path()) {
            candidates.push(entry.into_path());
        } else {
            ignored += 1;
        }
    }

    candidates.sort();
    Ok((candidates, ignored))
}

/// Resolve directives in every candidate file under `root`.
///
/// Runs on the current rayon pool; see [`crate::config::effective_threads`].
pub fn process_tree(
    root: &Path,
    scan: &ScanConfig,
    settings: DateSettings,
) -> Result<TreeReport, ProcessError> {
    let (candidates, ignored) = collect_candidates(root, scan)?;
    tracing::info!(
        candidates = candidates.len(),
        ignored,
        root = %root.display(),
        "Scanning files for DateReplace directives"
    );

    let files = candidates
        .par_iter()
        .map(|path| {
            let rel = relative_display(root, path);
            let _span = tracing::info_span!("file", path = %rel).entered();
            let status = process_file(path, settings);
            FileReport { path: rel, status }
        })
        .collect();

    Ok(TreeReport { files, ignored })
}

/// How a file's bytes were read as text, so they are written back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    /// Any other bytes, one char per byte. Lossless for Latin-1 and
    /// Windows-1252 pages since every delimiter the scanner looks for is ASCII.
    SingleByte,
}

fn decode(bytes: Vec<u8>) -> (String, Encoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, Encoding::Utf8),
        Err(e) => {
            let text = e.into_bytes().into_iter().map(char::from).collect();
            (text, Encoding::SingleByte)
        }
    }
}

/// Inverse of [`decode`]. `None` if a char does not fit in one byte.
fn encode(text: String, encoding: Encoding) -> Option<Vec<u8>> {
    match encoding {
        Encoding::Utf8 => Some(text.into_bytes()),
        Encoding::SingleByte => text.chars().map(|c| u8::try_from(c).ok()).collect(),
    }
}

/// Resolve directives in a single file, writing it back if a marker was seen.
///
/// Files that are not UTF-8 are scanned byte for byte and written back in
/// their own encoding.
pub fn process_file(path: &Path, settings: DateSettings) -> FileStatus {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read file, skipping");
            return FileStatus::Failed {
                error: format!("read failed: {e}"),
            };
        }
    };
    let (content, encoding) = decode(bytes);
    if encoding == Encoding::SingleByte {
        tracing::debug!("File is not UTF-8, scanning as single-byte text");
    }

    let outcome = apply_directives(content, settings.base, settings.start_index);
    if !outcome.modified() {
        return FileStatus::Unchanged;
    }

    let markers = outcome.markers;
    let replaced = outcome.replaced;
    let skipped = outcome.skipped.len();
    let Some(bytes) = encode(outcome.content, encoding) else {
        tracing::warn!("Rewritten text does not fit the file's encoding, skipping");
        return FileStatus::Failed {
            error: "write failed: rewritten text does not fit the file's encoding".to_string(),
        };
    };

    if let Err(e) = std::fs::write(path, bytes) {
        tracing::warn!(error = %e, "Could not write file, skipping");
        return FileStatus::Failed {
            error: format!("write failed: {e}"),
        };
    }

    if skipped > 0 {
        tracing::debug!(count = skipped, "Directives left unresolved");
    }
    FileStatus::Rewritten {
        markers,
        replaced,
        skipped,
    }
}

/// Path of `path` relative to `root`, with `/` separators on every platform.
fn relative_display(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
