//! Integration tests for the exporter API endpoints

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use health_exporter::{create_router, refresh, AppState};
use health_lib::{
    samples, ApiError, HealthModelIntegration, HealthRecord, HealthSnapshot, HealthSource,
    HealthState, SignalCatalog,
};
use std::sync::Arc;
use tower::ServiceExt;

struct UnreachableApi;

#[async_trait]
impl HealthSource for UnreachableApi {
    async fn fetch_all(&self) -> Result<HealthSnapshot, ApiError> {
        Err(ApiError::Status {
            status: 503,
            url: "http://health.test/entities".to_string(),
            body: "unavailable".to_string(),
        })
    }

    async fn fetch_entity(&self, entity_id: &str) -> Result<HealthRecord, ApiError> {
        Ok(HealthRecord::unknown(entity_id))
    }
}

fn offline_snapshot() -> HealthSnapshot {
    vec![
        HealthRecord::new("ecommerce-root", HealthState::Degraded)
            .with_detail("kind", "System_HealthModelRoot"),
        HealthRecord::new("api-service", HealthState::Healthy),
        HealthRecord::new("order-db", HealthState::Unhealthy),
    ]
    .into_iter()
    .collect()
}

fn setup_test_app(source: Box<dyn HealthSource>) -> (Router, Arc<AppState>) {
    let integration =
        HealthModelIntegration::new(samples::ecommerce_model(), source, SignalCatalog::standard());
    let state = Arc::new(AppState::new(integration, "api-service"));
    let router = create_router(state.clone());
    (router, state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_not_ready_before_first_refresh() {
    let (app, _state) = setup_test_app(Box::new(offline_snapshot()));

    let (status, body) = get_json(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    let (status, body) = get_json(app, "/report").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_healthz_is_live_before_refresh() {
    let (app, _state) = setup_test_app(Box::new(offline_snapshot()));

    let (status, body) = get_json(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "E-Commerce Production");
    assert!(body["workload"].is_null());
}

#[tokio::test]
async fn test_refresh_publishes_report() {
    let (app, state) = setup_test_app(Box::new(offline_snapshot()));
    refresh(&state).await.unwrap();

    let (status, body) = get_json(app.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);

    let (status, report) = get_json(app.clone(), "/report").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["model"], "E-Commerce Production");
    assert_eq!(report["summary"]["total_entities"], 3);
    assert_eq!(report["summary"]["unhealthy_count"], 1);
    assert_eq!(report["health_tree"]["order-db"]["state_color"], "red");
    assert_eq!(report["critical_path"][0], "api-service");

    let (_, health) = get_json(app, "/healthz").await;
    assert_eq!(health["workload"]["state"], "Degraded");
    assert_eq!(health["workload"]["state_color"], "amber");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, state) = setup_test_app(Box::new(offline_snapshot()));
    refresh(&state).await.unwrap();

    let (status, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("health_model_entities"));
    assert!(text.contains("health_model_workload_state"));
    assert!(text.contains("health_model_refresh_latency_seconds"));
}

#[tokio::test]
async fn test_impact_endpoint() {
    let (app, _state) = setup_test_app(Box::new(offline_snapshot()));

    let (status, body) = get_json(app.clone(), "/impact/payment-service").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failed_entity"], "payment-service");
    assert_eq!(body["impact_severity"], "critical");
    assert_eq!(body["affected_services"][0]["id"], "order-service");

    let (status, body) = get_json(app, "/impact/unknown-entity").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["impact_severity"], "low");
    assert_eq!(body["affected_services"], serde_json::json!([]));
}

#[tokio::test]
async fn test_failed_refresh_keeps_service_unready() {
    let (app, state) = setup_test_app(Box::new(UnreachableApi));

    let err = refresh(&state).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));
    assert!(!state.is_ready().await);

    let (status, _) = get_json(app, "/report").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (app, _state) = setup_test_app(Box::new(offline_snapshot()));
    let (status, _) = get(app, "/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
