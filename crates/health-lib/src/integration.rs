//! Integration facade
//!
//! Ties a static [`EntityGraph`], a [`HealthSource`] and a [`SignalCatalog`]
//! together. Source failures never escape from here: they are logged and
//! replaced with `Unknown` records or empty results.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::aggregate::{self, HealthSummary, HealthTree};
use crate::client::HealthSource;
use crate::error::ModelError;
use crate::graph::EntityGraph;
use crate::impact::{self, DependencyImpact};
use crate::models::HealthRecord;
use crate::report::HealthReport;
use crate::signals::{HealthSignal, SignalCatalog};
use crate::snapshot::HealthSnapshot;

pub struct HealthModelIntegration<S> {
    graph: EntityGraph,
    source: S,
    signals: SignalCatalog,
}

impl<S: HealthSource> HealthModelIntegration<S> {
    pub fn new(graph: EntityGraph, source: S, signals: SignalCatalog) -> Self {
        Self {
            graph,
            source,
            signals,
        }
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn signals(&self) -> &SignalCatalog {
        &self.signals
    }

    /// Current health of one entity, annotated with its configured name and type
    pub async fn entity_health(&self, entity_id: &str) -> HealthRecord {
        let mut record = match self.source.fetch_entity(entity_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    event = "entity_health_unavailable",
                    entity_id = %entity_id,
                    error = %e,
                    "Falling back to unknown health"
                );
                HealthRecord::from_error(entity_id, e.to_string())
            }
        };

        if let Some(entity) = self.graph.entity(entity_id) {
            record.entity_name = Some(entity.name.clone());
            record
                .details
                .insert("entityType".to_string(), Value::from(entity.entity_type.as_str()));
        }
        record
    }

    /// Health of every entity the source reports; empty on failure
    pub async fn all_entities_health(&self) -> HealthSnapshot {
        match self.source.fetch_all().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    event = "model_health_unavailable",
                    error = %e,
                    "Falling back to an empty snapshot"
                );
                HealthSnapshot::new()
            }
        }
    }

    /// Health history of one entity; empty on failure
    pub async fn entity_timeline(
        &self,
        entity_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_minutes: u32,
    ) -> Vec<HealthRecord> {
        match self
            .source
            .fetch_timeline(entity_id, start, end, interval_minutes)
            .await
        {
            Ok(timeline) => timeline,
            Err(e) => {
                warn!(
                    event = "timeline_unavailable",
                    entity_id = %entity_id,
                    error = %e,
                    "Falling back to an empty timeline"
                );
                Vec::new()
            }
        }
    }

    pub async fn workload_health(&self) -> HealthRecord {
        aggregate::workload_health(&self.all_entities_health().await)
    }

    pub async fn health_tree(&self) -> HealthTree {
        aggregate::build_health_tree(&self.graph, &self.all_entities_health().await)
    }

    pub async fn health_summary(&self) -> HealthSummary {
        aggregate::health_summary(&self.all_entities_health().await)
    }

    pub fn dependency_impact(&self, entity_id: &str) -> DependencyImpact {
        impact::dependency_impact(&self.graph, entity_id)
    }

    pub fn critical_path(&self, start_id: &str) -> Vec<String> {
        impact::critical_path(&self.graph, start_id)
    }

    /// Signal definitions for an entity's signal references, keyed by role
    ///
    /// Empty for an entity that is not in the graph.
    pub fn signal_definitions(&self, entity_id: &str) -> BTreeMap<String, HealthSignal> {
        self.graph
            .entity(entity_id)
            .map(|entity| self.signals.definitions_for(entity))
            .unwrap_or_default()
    }

    /// Report built from a single fetch of the source
    pub async fn health_report(&self, critical_path_start: &str) -> HealthReport {
        let snapshot = self.all_entities_health().await;
        HealthReport::build(&self.graph, &snapshot, critical_path_start)
    }

    pub async fn export_health_report(
        &self,
        path: impl AsRef<Path>,
        critical_path_start: &str,
    ) -> Result<HealthReport, ModelError> {
        let path = path.as_ref();
        let report = self.health_report(critical_path_start).await;
        report.export(path)?;
        info!(
            event = "report_exported",
            path = %path.display(),
            entities = report.health_tree.len(),
            "Health report exported"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{HealthState, StateColor};
    use crate::samples::ecommerce_model;
    use async_trait::async_trait;

    struct FailingSource;

    #[async_trait]
    impl HealthSource for FailingSource {
        async fn fetch_all(&self) -> Result<HealthSnapshot, ApiError> {
            Err(ApiError::InvalidToken)
        }

        async fn fetch_entity(&self, _entity_id: &str) -> Result<HealthRecord, ApiError> {
            Err(ApiError::Status {
                status: 503,
                url: "http://test/entities/x".to_string(),
                body: "unavailable".to_string(),
            })
        }

        async fn fetch_timeline(
            &self,
            _entity_id: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _interval_minutes: u32,
        ) -> Result<Vec<HealthRecord>, ApiError> {
            Err(ApiError::InvalidToken)
        }
    }

    fn offline() -> HealthModelIntegration<HealthSnapshot> {
        let snapshot: HealthSnapshot = vec![
            HealthRecord::new("api-service", HealthState::Healthy),
            HealthRecord::new("ecommerce-root", HealthState::Degraded)
                .with_detail("kind", "System_HealthModelRoot"),
        ]
        .into_iter()
        .collect();
        HealthModelIntegration::new(ecommerce_model(), snapshot, SignalCatalog::standard())
    }

    #[tokio::test]
    async fn test_entity_health_is_annotated_from_graph() {
        let integration = offline();
        let record = integration.entity_health("api-service").await;
        assert_eq!(record.state, HealthState::Healthy);
        assert_eq!(record.entity_name.as_deref(), Some("API Gateway"));
        assert_eq!(record.details["entityType"], "api");
    }

    #[tokio::test]
    async fn test_offline_views() {
        let integration = offline();
        assert_eq!(integration.workload_health().await.state, HealthState::Degraded);
        assert_eq!(integration.health_tree().await.len(), 9);
        assert_eq!(integration.health_summary().await.total_entities, 2);
    }

    #[tokio::test]
    async fn test_source_failures_degrade_to_unknown() {
        let integration =
            HealthModelIntegration::new(ecommerce_model(), FailingSource, SignalCatalog::new());

        let record = integration.entity_health("order-db").await;
        assert_eq!(record.state, HealthState::Unknown);
        assert_eq!(record.state_color, StateColor::Gray);
        assert!(record.error.as_deref().unwrap().contains("503"));
        assert_eq!(record.entity_name.as_deref(), Some("Order Database"));

        assert!(integration.all_entities_health().await.is_empty());
        assert!(integration
            .entity_timeline("order-db", Utc::now(), Utc::now(), 5)
            .await
            .is_empty());

        let workload = integration.workload_health().await;
        assert_eq!(workload.state, HealthState::Unknown);
        assert!(workload.entity_id.is_none());

        let tree = integration.health_tree().await;
        assert!(tree.values().all(|node| node.state == HealthState::Unknown));
    }

    #[test]
    fn test_signal_definitions() {
        let integration = offline();
        let defs = integration.signal_definitions("product-db");
        assert_eq!(defs.len(), 2);
        assert_eq!(defs["connection_pool"].name, "db_connection_pool_utilization");
        assert!(integration.signal_definitions("missing").is_empty());
    }

    #[tokio::test]
    async fn test_export_health_report() {
        let integration = offline();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let report = integration
            .export_health_report(&path, "api-service")
            .await
            .unwrap();
        assert_eq!(report.critical_path.len(), 7);
        assert!(path.exists());
    }
}
