//! Health Exporter - health model reporting service
//!
//! Polls a health model, publishes Prometheus metrics and serves the latest
//! health report over HTTP.

use anyhow::{Context, Result};
use health_exporter::{api, refresh, ExporterConfig};
use health_lib::{
    samples, EntityGraph, HealthModelIntegration, HealthSnapshot, HealthSource,
    HealthStateClient, SignalCatalog,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn load_graph(config: &ExporterConfig) -> Result<EntityGraph> {
    if let Some(path) = &config.model_file {
        return EntityGraph::load(path).with_context(|| format!("Failed to load model {}", path));
    }
    match config.sample.as_str() {
        "ecommerce" => Ok(samples::ecommerce_model()),
        "microservices" => Ok(samples::microservices_model()),
        other => anyhow::bail!("Unknown sample model '{}'", other),
    }
}

fn build_source(config: &ExporterConfig) -> Result<Box<dyn HealthSource>> {
    if let Some(path) = &config.snapshot_file {
        let snapshot = HealthSnapshot::load(path)
            .with_context(|| format!("Failed to load snapshot {}", path))?;
        info!(path = %path, entities = snapshot.len(), "Serving offline snapshot");
        return Ok(Box::new(snapshot));
    }

    let settings = config.api_settings()?;
    info!(
        health_model = %settings.health_model_name,
        base_url = %settings.base_url,
        "Using health model API"
    );
    let client = HealthStateClient::new(settings).context("Failed to create API client")?;
    Ok(Box::new(client))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting health-exporter");

    let config = ExporterConfig::load()?;
    let graph = load_graph(&config)?;
    let source = build_source(&config)?;
    let entity_count = graph.entity_count();

    let integration = HealthModelIntegration::new(graph, source, SignalCatalog::standard());
    let state = Arc::new(api::AppState::new(
        integration,
        config.critical_path_start.clone(),
    ));
    state.logger.log_startup(EXPORTER_VERSION, entity_count);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let refresh_handle = tokio::spawn(refresh::run_refresh_loop(
        state.clone(),
        Duration::from_secs(config.refresh_interval_secs.max(1)),
        shutdown_rx,
    ));
    let api_handle = tokio::spawn(api::serve(config.port, state.clone()));

    tokio::signal::ctrl_c().await?;
    state.logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    let _ = refresh_handle.await;
    api_handle.abort();

    Ok(())
}
