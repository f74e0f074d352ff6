//! End-to-end re-dating of a course package.
//!
//! ```text
//! 1. Check     input exists
//! 2. Unpack    package  →  work dir        (ArchiveBackend::unpack)
//! 3. Process   work dir →  work dir        (directive rewrite, in place)
//! 4. Repack    work dir →  output package  (ArchiveBackend::pack)
//! ```
//!
//! The work dir is a temporary directory removed when the run ends, unless the
//! caller supplies one, in which case the rewritten tree is left there. A
//! failed repack does not undo the in-place edits.

use crate::archive::{ArchiveBackend, ArchiveError, default_output_path};
use crate::config::ToolConfig;
use crate::process::{DateSettings, ProcessError, TreeReport, process_tree};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Archive file not found at '{}'", .0.display())]
    InputNotFound(PathBuf),
    #[error("Failed to unpack the archive: {0}")]
    Unpack(#[source] ArchiveError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("Failed to repack the archive to '{}': {source}", .output.display())]
    Pack {
        output: PathBuf,
        #[source]
        source: ArchiveError,
    },
}

/// Everything needed for one run.
#[derive(Debug, Clone)]
pub struct RedateOptions {
    pub input: PathBuf,
    /// Output package; defaults to `<stem>_updated.<ext>` next to the input.
    pub output: Option<PathBuf>,
    /// Keep the unpacked tree here instead of a temporary directory.
    pub work_dir: Option<PathBuf>,
    pub settings: DateSettings,
    pub config: ToolConfig,
}

impl RedateOptions {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Set when the unpacked tree was kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    pub base_date: String,
    pub start_index: i64,
    pub tree: TreeReport,
}

enum WorkDir {
    Temp(TempDir),
    Kept(PathBuf),
}

impl WorkDir {
    fn prepare(requested: Option<&Path>) -> std::io::Result<Self> {
        match requested {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Ok(Self::Kept(dir.to_path_buf()))
            }
            None => tempfile::Builder::new()
                .prefix("course-redate-")
                .tempdir()
                .map(Self::Temp),
        }
    }

    fn path(&self) -> &Path {
        match self {
            Self::Temp(dir) => dir.path(),
            Self::Kept(dir) => dir,
        }
    }

    fn kept(&self) -> Option<PathBuf> {
        match self {
            Self::Temp(_) => None,
            Self::Kept(dir) => Some(dir.clone()),
        }
    }
}

/// Unpack, rewrite and repack the package described by `options`.
pub fn redate_archive(
    options: &RedateOptions,
    backend: &impl ArchiveBackend,
) -> Result<RunSummary, PipelineError> {
    if !options.input.is_file() {
        return Err(PipelineError::InputNotFound(options.input.clone()));
    }
    let output = options.output_path();

    let work_dir = WorkDir::prepare(options.work_dir.as_deref())?;
    tracing::info!(
        input = %options.input.display(),
        work_dir = %work_dir.path().display(),
        "Unpacking archive"
    );
    backend
        .unpack(&options.input, work_dir.path())
        .map_err(PipelineError::Unpack)?;

    let tree = process_tree(work_dir.path(), &options.config.scan, options.settings)?;

    tracing::info!(output = %output.display(), "Repacking archive");
    backend
        .pack(work_dir.path(), &output)
        .map_err(|source| PipelineError::Pack {
            output: output.clone(),
            source,
        })?;

    Ok(RunSummary {
        input: options.input.clone(),
        output,
        work_dir: work_dir.kept(),
        base_date: options.settings.base.to_string(),
        start_index: options.settings.start_index,
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::{MockArchive, RecordedOp};
    use crate::date::CalendarDate;
    use crate::test_helpers::fixture_files;
    use pretty_assertions::assert_eq;

    fn options(tmp: &TempDir) -> RedateOptions {
        let input = tmp.path().join("bio101.imscc");
        std::fs::write(&input, b"PK placeholder").unwrap();
        RedateOptions {
            input,
            output: None,
            work_dir: None,
            settings: DateSettings {
                base: CalendarDate::from_ymd(2024, 8, 26).unwrap(),
                start_index: 1,
            },
            config: ToolConfig::default(),
        }
    }

    fn fixture_backend() -> MockArchive {
        let files = fixture_files();
        let refs: Vec<(&str, &str)> = files
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_str()))
            .collect();
        MockArchive::with_files(&refs)
    }

    #[test]
    fn redates_and_repacks_to_default_output() {
        let tmp = TempDir::new().unwrap();
        let opts = options(&tmp);
        let backend = fixture_backend();

        let summary = redate_archive(&opts, &backend).unwrap();

        assert_eq!(summary.output, tmp.path().join("bio101_updated.imscc"));
        assert!(summary.output.is_file());
        assert_eq!(summary.work_dir, None);
        assert_eq!(summary.base_date, "08/26/2024");
        assert_eq!(summary.tree.dates_replaced(), 5);

        let packed = backend
            .packed_file("wiki_content/unit-1-overview.html")
            .unwrap();
        assert!(packed.contains(">Monday, August 26<"));
        assert_eq!(
            backend.packed_file("notes.txt"),
            fixture_files()
                .into_iter()
                .find(|(p, _)| p == "notes.txt")
                .map(|(_, c)| c)
        );
    }

    #[test]
    fn unpacks_then_packs_same_work_dir() {
        let tmp = TempDir::new().unwrap();
        let opts = options(&tmp);
        let backend = fixture_backend();
        redate_archive(&opts, &backend).unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        let (RecordedOp::Unpack { archive, dest }, RecordedOp::Pack { source, .. }) =
            (&ops[0], &ops[1])
        else {
            panic!("unexpected operations: {ops:?}");
        };
        assert_eq!(archive, &opts.input);
        assert_eq!(dest, source);
        // Temporary work dir is cleaned up
        assert!(!dest.exists());
    }

    #[test]
    fn explicit_output_and_work_dir() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(&tmp);
        opts.output = Some(tmp.path().join("out/fall.imscc"));
        opts.work_dir = Some(tmp.path().join("unzipped_archive"));
        std::fs::create_dir_all(tmp.path().join("out")).unwrap();
        let backend = fixture_backend();

        let summary = redate_archive(&opts, &backend).unwrap();

        assert_eq!(summary.output, tmp.path().join("out/fall.imscc"));
        assert_eq!(summary.work_dir, opts.work_dir);
        let kept = std::fs::read_to_string(
            tmp.path()
                .join("unzipped_archive/wiki_content/unit-2-cells.html"),
        )
        .unwrap();
        assert!(kept.contains(">September 02, 2024<"));
    }

    #[test]
    fn missing_input_fails_before_unpacking() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(&tmp);
        opts.input = tmp.path().join("missing.imscc");
        let backend = fixture_backend();

        let err = redate_archive(&opts, &backend).unwrap_err();

        assert!(matches!(err, PipelineError::InputNotFound(_)));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn unpack_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let opts = options(&tmp);
        let backend = MockArchive {
            fail_unpack: true,
            ..fixture_backend()
        };

        let err = redate_archive(&opts, &backend).unwrap_err();

        assert!(matches!(err, PipelineError::Unpack(_)));
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn pack_failure_keeps_edits_in_work_dir() {
        let tmp = TempDir::new().unwrap();
        let mut opts = options(&tmp);
        opts.work_dir = Some(tmp.path().join("work"));
        let backend = MockArchive {
            fail_pack: true,
            ..fixture_backend()
        };

        let err = redate_archive(&opts, &backend).unwrap_err();

        assert!(matches!(err, PipelineError::Pack { .. }));
        assert!(err.to_string().contains("bio101_updated.imscc"));
        let edited =
            std::fs::read_to_string(tmp.path().join("work/wiki_content/unit-1-overview.html"))
                .unwrap();
        assert!(edited.contains(">Fri Aug 30<"));
    }
}
