//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Defaults read from `~/.config/hm/config.json`
///
/// Flags and environment variables take precedence over every value here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub health_model_name: Option<String>,
    /// Health model API base URL
    pub api_url: Option<String>,
    /// Model document used when neither `--model-file` nor `--sample` is given
    pub model_file: Option<String>,
}

impl Config {
    /// Load configuration from file; a missing file yields defaults
    pub fn load() -> Result<Self> {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("hm").join("config.json"))
    }
}

/// First value present, in precedence order
pub fn pick(flag: Option<String>, file: Option<&String>) -> Option<String> {
    flag.or_else(|| file.cloned())
}
