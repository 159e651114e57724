//! HTTP API for health checks, Prometheus metrics and health reports

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use health_lib::{
    HealthModelIntegration, HealthRecord, HealthReport, HealthSnapshot, HealthSource,
    ReportMetrics, StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{error, info};

/// Result of the most recent successful refresh
#[derive(Debug, Clone)]
pub struct LatestReport {
    pub report: HealthReport,
    pub workload: HealthRecord,
    pub snapshot: HealthSnapshot,
}

/// Shared application state
pub struct AppState {
    pub integration: HealthModelIntegration<Box<dyn HealthSource>>,
    pub metrics: ReportMetrics,
    pub logger: StructuredLogger,
    pub critical_path_start: String,
    latest: RwLock<Option<LatestReport>>,
}

impl AppState {
    pub fn new(
        integration: HealthModelIntegration<Box<dyn HealthSource>>,
        critical_path_start: impl Into<String>,
    ) -> Self {
        let logger = StructuredLogger::new(&integration.graph().info().model_name);
        Self {
            integration,
            metrics: ReportMetrics::new(),
            logger,
            critical_path_start: critical_path_start.into(),
            latest: RwLock::new(None),
        }
    }

    pub async fn latest(&self) -> RwLockReadGuard<'_, Option<LatestReport>> {
        self.latest.read().await
    }

    /// Swap in a new report, returning the previous one
    pub async fn publish(&self, latest: LatestReport) -> Option<LatestReport> {
        self.latest.write().await.replace(latest)
    }

    /// Ready once the first refresh has completed
    pub async fn is_ready(&self) -> bool {
        self.latest.read().await.is_some()
    }
}

/// Liveness: always 200 while the process serves requests
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest().await;
    let workload = latest.as_ref().map(|l| {
        json!({
            "state": l.workload.state,
            "state_color": l.workload.state_color,
        })
    });

    Json(json!({
        "status": "ok",
        "model": state.integration.graph().info().model_name,
        "workload": workload,
    }))
}

/// Readiness: 503 until the first refresh completes
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let ready = state.is_ready().await;
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(json!({ "ready": ready })))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Latest health report
async fn report(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.latest().await.as_ref() {
        Some(latest) => Json(latest.report.clone()).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "no health report available yet" })),
        )
            .into_response(),
    }
}

/// Blast radius of an entity failing
async fn impact(
    State(state): State<Arc<AppState>>,
    Path(entity_id): Path<String>,
) -> impl IntoResponse {
    Json(state.integration.dependency_impact(&entity_id))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/report", get(report))
        .route("/impact/:entity_id", get(impact))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
