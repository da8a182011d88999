use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV: &str = "DATA_CANVAS_CONFIG";
/// Settings file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "data-canvas.json";

// ---------------------------------------------------------------------------
// Viewer settings
// ---------------------------------------------------------------------------

/// Viewer settings. Every key is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Rows shown on the preview screen.
    pub preview_rows: usize,
    /// Uploads above this size are logged; they are never rejected.
    pub upload_size_hint_bytes: u64,
    /// Appended to the file stem of exports.
    pub export_suffix: String,
    /// Characters of the file name shown on the dataset card.
    pub name_display_chars: usize,
    /// Text columns with at most this many unique values get checkbox filters.
    pub categorical_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            preview_rows: 10,
            upload_size_hint_bytes: 10 * 1024 * 1024,
            export_suffix: "_filtered".to_string(),
            name_display_chars: 12,
            categorical_limit: 25,
        }
    }
}

impl DashboardConfig {
    /// Load from `$DATA_CANVAS_CONFIG`, else `./data-canvas.json` when it
    /// exists, else defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("invalid JSON settings")?;
        Ok(config)
    }
}
