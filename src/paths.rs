//! Default locations for pixcache on-disk data
//!
//! Cached image bytes live under the platform cache directory
//! (~/.cache/pixcache/ on Linux); the optional config file lives under the
//! platform config directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the default image cache directory (~/.cache/pixcache/)
pub fn default_cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join("pixcache");
    fs::create_dir_all(&dir).context("Failed to create pixcache directory")?;
    Ok(dir)
}

/// Get the config file path (~/.config/pixcache/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join("pixcache").join("config.toml"))
}
