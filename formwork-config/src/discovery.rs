//! Configuration file discovery

use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::trace;

/// File names looked for in the search directory, lowest precedence first.
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "formwork.json",
    "formwork.yml",
    "formwork.yaml",
    "formwork.toml",
];

/// Configuration file format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect format from a path, failing for unknown extensions.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| ConfigError::UnsupportedFormat {
            format: ext.to_string(),
        })
    }
}

/// A configuration file and its format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub format: ConfigFormat,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let format = ConfigFormat::from_path(&path)?;
        Ok(Self { path, format })
    }
}

/// Every known configuration file present in `dir`, lowest precedence first.
pub fn discover(dir: &Path) -> Vec<ConfigFile> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .filter_map(|path| {
            trace!(path = %path.display(), "found configuration file");
            ConfigFile::new(path).ok()
        })
        .collect()
}
