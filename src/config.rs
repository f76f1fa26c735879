//! Sampler configuration with XDG paths
//!
//! ~/.config/treesample/config.json - limits, timeout, ignore list

use crate::exclude::{IgnoreSet, DEFAULT_IGNORES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "treesample";

/// Get config directory (~/.config/treesample/)
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .context("Could not determine config directory")?;
    Ok(base.join(APP_NAME))
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

/// Sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Wall-clock budget for one recursive walk
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Result cap used when the caller has no limit of its own
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Glob patterns excluded from recursive listings
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Expand directories reached through symlinks
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,

    /// Also apply .gitignore files (root and nested) to recursive listings
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

fn default_timeout_ms() -> u64 { 100_000 }
fn default_limit() -> usize { 200 }
fn default_true() -> bool { true }

fn default_ignore_patterns() -> Vec<String> {
    DEFAULT_IGNORES.iter().map(|s| s.to_string()).collect()
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            default_limit: default_limit(),
            ignore_patterns: default_ignore_patterns(),
            follow_symlinks: true,
            respect_gitignore: true,
        }
    }
}

impl SamplerConfig {
    /// Load config from the XDG location, or return defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load config from a specific file, or return defaults if it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SamplerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Compile the configured ignore patterns
    pub fn ignore_set(&self) -> IgnoreSet {
        IgnoreSet::new(&self.ignore_patterns)
    }
}
