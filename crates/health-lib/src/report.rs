//! Health report: summary, tree and critical path in one document

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::aggregate::{build_health_tree, health_summary, HealthSummary, HealthTree};
use crate::error::ModelError;
use crate::graph::EntityGraph;
use crate::impact::critical_path;
use crate::snapshot::HealthSnapshot;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    /// Model display name
    pub model: String,
    pub summary: HealthSummary,
    pub health_tree: HealthTree,
    pub critical_path: Vec<String>,
}

impl HealthReport {
    /// Build a report from one materialized snapshot
    pub fn build(graph: &EntityGraph, snapshot: &HealthSnapshot, critical_path_start: &str) -> Self {
        Self {
            generated_at: Utc::now(),
            model: graph.info().model_name.clone(),
            summary: health_summary(snapshot),
            health_tree: build_health_tree(graph, snapshot),
            critical_path: critical_path(graph, critical_path_start),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let content = self.to_json_pretty()?;
        std::fs::write(path, content).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
