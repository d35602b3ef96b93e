use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ephu::kato::error::{KatoError, Result};

/// Folder the consolidated workbooks are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "итоговые_файлы";
/// Prefix of stale generated folders removed before a run.
pub const DEFAULT_CLEANUP_PREFIX: &str = "като_файлы";
/// Codes that are written at most once per run.
pub const DEFAULT_SKIP_LIST: [&str; 1] = ["25022025"];

/// Settings for a sorter run. Every field has a default, so an empty JSON
/// object is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterConfig {
    /// Root scanned for source workbooks.
    pub input_dir: PathBuf,
    /// Root of the per-region output folders.
    pub output_dir: PathBuf,
    /// Case-insensitive name prefix of folders removed during cleanup.
    pub cleanup_prefix: String,
    /// File extension of source workbooks, without the dot.
    pub extension: String,
    /// Number of leading rows searched for the application and header rows.
    pub preview_rows: usize,
    /// Upper bound for auto-sized column widths.
    pub max_width: usize,
    pub skip_list: Vec<String>,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            cleanup_prefix: DEFAULT_CLEANUP_PREFIX.to_string(),
            extension: "xlsx".to_string(),
            preview_rows: 15,
            max_width: 30,
            skip_list: DEFAULT_SKIP_LIST.iter().map(|code| code.to_string()).collect(),
        }
    }
}

impl SorterConfig {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(KatoError::MissingInput(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn with_input(mut self, input_dir: impl Into<PathBuf>) -> Self {
        self.input_dir = input_dir.into();
        self
    }

    pub fn with_output(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}
