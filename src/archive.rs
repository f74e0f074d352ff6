//! Course package unpacking and repacking.
//!
//! The zip format itself is not handled here: [`CommandBackend`] shells out to
//! the system `unzip` and `zip` tools (or whatever [`ArchiveConfig`] names).
//! The [`ArchiveBackend`] trait keeps the pipeline independent of those tools
//! so it can be tested without them.

use crate::config::ArchiveConfig;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not run '{program}': {source}. Make sure it is installed and on your PATH")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Unpack/repack operations the pipeline needs.
pub trait ArchiveBackend {
    /// Extract `archive` into `dest`, overwriting existing files.
    fn unpack(&self, archive: &Path, dest: &Path) -> Result<(), ArchiveError>;

    /// Write the contents of `source_dir` (not the directory itself) to a new
    /// archive at `archive`.
    fn pack(&self, source_dir: &Path, archive: &Path) -> Result<(), ArchiveError>;
}

/// Backend that runs external `unzip`/`zip` commands.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    unzip: String,
    zip: String,
}

impl CommandBackend {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            unzip: config.unzip.clone(),
            zip: config.zip.clone(),
        }
    }

    fn run(&self, program: &str, command: &mut Command) -> Result<(), ArchiveError> {
        tracing::debug!(?command, "Running archive command");
        let output = command.output().map_err(|source| ArchiveError::Spawn {
            program: program.to_string(),
            source,
        })?;
        if !output.status.success() {
            return Err(ArchiveError::CommandFailed {
                program: program.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Default for CommandBackend {
    fn default() -> Self {
        Self::new(&ArchiveConfig::default())
    }
}

impl ArchiveBackend for CommandBackend {
    fn unpack(&self, archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
        std::fs::create_dir_all(dest)?;
        self.run(
            &self.unzip,
            Command::new(&self.unzip)
                .arg("-o")
                .arg("-q")
                .arg(archive)
                .arg("-d")
                .arg(dest),
        )
    }

    fn pack(&self, source_dir: &Path, archive: &Path) -> Result<(), ArchiveError> {
        // zip runs from inside source_dir so entries are stored relative to it
        let archive = std::path::absolute(archive)?;
        remove_stale_archive(&archive)?;
        self.run(
            &self.zip,
            Command::new(&self.zip)
                .arg("-r")
                .arg("-q")
                .arg(&archive)
                .arg(".")
                .current_dir(source_dir),
        )
    }
}

/// Remove a previous archive at `path`; `zip -r` would otherwise merge into it
/// and keep entries that no longer exist in the source tree.
fn remove_stale_archive(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "Replacing existing output archive");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Default output location: `<stem>_updated.<ext>` next to the input.
///
/// - `course.imscc` → `course_updated.imscc`
/// - `exports/Bio 101.zip` → `exports/Bio 101_updated.zip`
/// - `package` → `package_updated`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let filename = match input.extension() {
        Some(ext) => format!("{stem}_updated.{}", ext.to_string_lossy()),
        None => format!("{stem}_updated"),
    };
    input.with_file_name(filename)
}
