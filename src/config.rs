//! Tool configuration.
//!
//! Everything here is optional; without a config file the stock defaults
//! below are used. Pass `--config <path>` to load overrides, or run with
//! `--gen-config` to print a documented starting point.
//!
//! ```toml
//! [scan]
//! extensions = ["html", "htm", "xml", "txt"]  # Files scanned for directives
//!
//! [archive]
//! unzip = "unzip"           # Command used to unpack the course package
//! zip = "zip"               # Command used to repack it
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Config files are sparse: override only what you need. Unknown keys are
//! rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Which files are scanned for directives.
    pub scan: ScanConfig,
    /// External archive commands.
    pub archive: ArchiveConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ToolConfig {
    /// Validate values that serde alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "scan.extensions must not be empty".into(),
            ));
        }
        if self
            .scan
            .extensions
            .iter()
            .any(|e| e.trim_start_matches('.').is_empty())
        {
            return Err(ConfigError::Validation(
                "scan.extensions entries must not be blank".into(),
            ));
        }
        if self.archive.unzip.trim().is_empty() || self.archive.zip.trim().is_empty() {
            return Err(ConfigError::Validation(
                "archive.unzip and archive.zip must name a command".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Text file selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// File extensions (without the dot, case-insensitive) that may contain
    /// directives. Everything else in the package is left byte-for-byte alone.
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: ["html", "htm", "xml", "txt"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ScanConfig {
    /// Whether `path` has one of the configured extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}

/// Commands used to unpack and repack the course package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    pub unzip: String,
    pub zip: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            unzip: "unzip".to_string(),
            zip: "zip".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel file workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Load and validate a config file. `None` yields the stock defaults.
pub fn load_config(path: Option<&Path>) -> Result<ToolConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ToolConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by `--gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# course-redate configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys are rejected.
#
# Use with: course-redate --config redate.toml --start MM/DD/YYYY course.imscc

# ---------------------------------------------------------------------------
# Scanning
# ---------------------------------------------------------------------------
[scan]
# Extensions (no dot, case-insensitive) of files searched for
# DateReplace(...) directives. All other files are copied untouched.
extensions = ["html", "htm", "xml", "txt"]

# ---------------------------------------------------------------------------
# Archive tools
# ---------------------------------------------------------------------------
[archive]
# Invoked as: <unzip> -o -q <package> -d <work dir>
unzip = "unzip"
# Invoked from inside the work dir as: <zip> -r -q <output> .
zip = "zip"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit for auto (= number of CPU cores).
# Values above the core count are clamped down.
# max_processes = 4
"##
}
