//! Passdeck configuration
//!
//! Configuration file: ~/.config/passdeck/config.yaml
//!
//! Every field is optional; a missing file yields the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::Paths;

/// Default name of the encrypted store file
pub const DEFAULT_STORE_FILE: &str = "passwords.age";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Where the credential store lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the storage directory
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// File name of the encrypted store inside the storage directory
    #[serde(default = "default_store_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file: default_store_file(),
        }
    }
}

/// Terminal UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Render secrets as bullets until revealed
    #[serde(default = "default_true")]
    pub mask_secrets: bool,

    /// Event poll interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mask_secrets: true,
            tick_ms: default_tick_ms(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing filter, overridden by RUST_LOG
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_store_file() -> String {
    DEFAULT_STORE_FILE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_tick_ms() -> u64 {
    250
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load(paths: &Paths) -> Result<Self> {
        Self::load_from(&paths.config_file())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        // An empty file is a valid "all defaults" config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Full path of the store file for the given storage directory
    pub fn store_file(&self, location: &Path) -> PathBuf {
        location.join(&self.storage.file)
    }
}
