//! Configuration for the image cache and loader

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cache and loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory for persisted image bytes (default: platform cache dir)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Maximum number of decoded images kept in memory
    #[serde(default = "default_max_memory_entries")]
    pub max_memory_entries: usize,

    /// Timeout for remote fetches, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Downscale decoded images so neither dimension exceeds this
    /// (None = keep original size)
    #[serde(default)]
    pub downscale_to: Option<u32>,
}

fn default_max_memory_entries() -> usize {
    50
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_memory_entries: default_max_memory_entries(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            downscale_to: None,
        }
    }
}

impl CacheConfig {
    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = crate::paths::config_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = crate::paths::config_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }
}
