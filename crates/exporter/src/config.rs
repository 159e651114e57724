//! Exporter configuration

use anyhow::{Context, Result};
use health_lib::client::{DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use health_lib::ApiSettings;
use serde::Deserialize;

/// Exporter configuration, read from `HEALTH_EXPORTER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// HTTP port for health, metrics and report endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds between health refreshes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Model document to load; takes precedence over `sample`
    #[serde(default)]
    pub model_file: Option<String>,

    /// Built-in sample model (`ecommerce` or `microservices`)
    #[serde(default = "default_sample")]
    pub sample: String,

    /// Offline snapshot file; when set the API is not contacted
    #[serde(default)]
    pub snapshot_file: Option<String>,

    /// Entity the critical path is traced from
    #[serde(default = "default_critical_path_start")]
    pub critical_path_start: String,

    #[serde(default)]
    pub subscription_id: Option<String>,

    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub health_model_name: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_sample() -> String {
    "ecommerce".to_string()
}

fn default_critical_path_start() -> String {
    health_lib::DEFAULT_CRITICAL_PATH_START.to_string()
}

fn default_api_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            refresh_interval_secs: default_refresh_interval(),
            model_file: None,
            sample: default_sample(),
            snapshot_file: None,
            critical_path_start: default_critical_path_start(),
            subscription_id: None,
            resource_group: None,
            health_model_name: None,
            auth_token: None,
            api_url: default_api_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("HEALTH_EXPORTER"))
    }

    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read exporter configuration")?;

        config
            .try_deserialize()
            .context("Invalid exporter configuration")
    }

    /// API settings, when every required value is present
    pub fn api_settings(&self) -> Result<ApiSettings> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .with_context(|| format!("HEALTH_EXPORTER_{} is required without a snapshot file", name))
        };

        let mut settings = ApiSettings::new(
            required(&self.subscription_id, "SUBSCRIPTION_ID")?,
            required(&self.resource_group, "RESOURCE_GROUP")?,
            required(&self.health_model_name, "HEALTH_MODEL_NAME")?,
            required(&self.auth_token, "AUTH_TOKEN")?,
        )
        .with_base_url(&self.api_url);
        settings.api_version = self.api_version.clone();
        settings.timeout_secs = self.request_timeout_secs;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_env(vars: &[(&str, &str)]) -> Result<ExporterConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (format!("HEALTH_EXPORTER_{k}"), v.to_string()))
            .collect();
        ExporterConfig::from_source(
            config::Environment::with_prefix("HEALTH_EXPORTER")
                .source(Some(map))
                .try_parsing(true),
        )
    }

    #[test]
    fn test_defaults() {
        let config = from_env(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.sample, "ecommerce");
        assert_eq!(config.critical_path_start, "root");
        assert_eq!(config.api_url, "https://management.azure.com");
        assert!(config.snapshot_file.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = from_env(&[
            ("PORT", "9100"),
            ("SAMPLE", "microservices"),
            ("SUBSCRIPTION_ID", "sub"),
            ("RESOURCE_GROUP", "rg"),
            ("HEALTH_MODEL_NAME", "model"),
            ("AUTH_TOKEN", "tok"),
        ])
        .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.sample, "microservices");

        let settings = config.api_settings().unwrap();
        assert_eq!(settings.health_model_name, "model");
        assert_eq!(settings.api_version, "2025-05-01-preview");
    }

    #[test]
    fn test_api_settings_require_credentials() {
        let config = ExporterConfig {
            subscription_id: Some("sub".to_string()),
            ..ExporterConfig::default()
        };
        let err = config.api_settings().unwrap_err();
        assert!(err.to_string().contains("RESOURCE_GROUP"));
    }
}
