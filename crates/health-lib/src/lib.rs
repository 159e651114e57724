//! Health model library
//!
//! This crate provides the core functionality for:
//! - Entity graph and dependency queries
//! - Health record snapshots with unknown defaults
//! - Aggregated views (health tree, summary, workload health)
//! - Dependency impact and critical path analysis
//! - REST access to the health model API
//! - Structured logging and metrics

pub mod aggregate;
pub mod client;
pub mod error;
pub mod graph;
pub mod impact;
pub mod integration;
pub mod models;
pub mod observability;
pub mod ordered;
pub mod report;
pub mod samples;
pub mod signals;
pub mod snapshot;

pub use aggregate::{
    build_health_tree, health_summary, workload_health, DependencySummary, EntityRef,
    HealthSummary, HealthTree, StateBuckets, TreeNode, WORKLOAD_ROOT_KIND,
};
pub use client::{ApiSettings, HealthSource, HealthStateClient};
pub use error::{ApiError, ModelError};
pub use graph::{EntityGraph, ModelInfo};
pub use impact::{critical_path, dependency_impact, AffectedService, DependencyImpact, DEFAULT_CRITICAL_PATH_START};
pub use integration::HealthModelIntegration;
pub use models::*;
pub use observability::{ReportMetrics, StructuredLogger};
pub use ordered::OrderedMap;
pub use report::HealthReport;
pub use signals::{HealthSignal, HealthThreshold, SignalCatalog, SignalType, ThresholdOperator};
pub use snapshot::HealthSnapshot;
