//! CLI command implementations

pub mod analysis;
pub mod health;
pub mod model;
pub mod report;

use anyhow::{Context, Result};
use clap::ValueEnum;
use health_lib::{
    samples, ApiSettings, EntityGraph, HealthModelIntegration, HealthSnapshot, HealthSource,
    HealthStateClient, SignalCatalog,
};
use std::path::PathBuf;
use tracing::debug;

use crate::output::OutputFormat;

/// Built-in sample models
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SampleModel {
    Ecommerce,
    Microservices,
}

/// Where the entity graph comes from
#[derive(Debug, Clone)]
pub enum ModelSource {
    File(PathBuf),
    Sample(SampleModel),
}

/// API connection values after merging flags, environment and config file
#[derive(Debug, Clone, Default)]
pub struct ApiArgs {
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub health_model_name: Option<String>,
    pub auth_token: Option<String>,
    pub api_url: Option<String>,
}

impl ApiArgs {
    fn settings(&self) -> Result<ApiSettings> {
        fn required(value: &Option<String>, flag: &str, env: &str) -> Result<String> {
            value.clone().with_context(|| {
                format!("Missing {flag} (or {env}); pass --snapshot <file> to work offline")
            })
        }

        let mut settings = ApiSettings::new(
            required(&self.subscription_id, "--subscription-id", "AZURE_SUBSCRIPTION_ID")?,
            required(&self.resource_group, "--resource-group", "AZURE_RESOURCE_GROUP")?,
            required(&self.health_model_name, "--health-model", "HEALTH_MODEL_NAME")?,
            required(&self.auth_token, "--token", "AZURE_AUTH_TOKEN")?,
        );
        if let Some(url) = &self.api_url {
            settings = settings.with_base_url(url);
        }
        Ok(settings)
    }
}

/// Everything a command needs to find its model and health data
pub struct Session {
    pub format: OutputFormat,
    pub model: ModelSource,
    pub snapshot: Option<PathBuf>,
    pub api: ApiArgs,
}

impl Session {
    /// Load the entity graph
    pub fn graph(&self) -> Result<EntityGraph> {
        match &self.model {
            ModelSource::File(path) => EntityGraph::load(path)
                .with_context(|| format!("Failed to load model {}", path.display())),
            ModelSource::Sample(SampleModel::Ecommerce) => Ok(samples::ecommerce_model()),
            ModelSource::Sample(SampleModel::Microservices) => Ok(samples::microservices_model()),
        }
    }

    /// Health record source: the offline snapshot when given, else the API
    pub fn source(&self) -> Result<Box<dyn HealthSource>> {
        if let Some(path) = &self.snapshot {
            debug!(path = %path.display(), "Using offline snapshot");
            let snapshot = HealthSnapshot::load(path)
                .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
            return Ok(Box::new(snapshot));
        }

        let settings = self.api.settings()?;
        debug!(
            health_model = %settings.health_model_name,
            base_url = %settings.base_url,
            "Using health model API"
        );
        let client = HealthStateClient::new(settings).context("Failed to create API client")?;
        Ok(Box::new(client))
    }

    pub fn integration(&self) -> Result<HealthModelIntegration<Box<dyn HealthSource>>> {
        Ok(HealthModelIntegration::new(
            self.graph()?,
            self.source()?,
            SignalCatalog::standard(),
        ))
    }
}
