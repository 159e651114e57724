//! Health signal definitions
//!
//! Signals describe the metrics, log queries or custom indicators that the
//! health model service uses to compute entity health. They are descriptive
//! metadata here: thresholds are published and displayed, never evaluated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ModelError;
use crate::models::Entity;

/// Kind of data source behind a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Metric,
    LogQuery,
    Custom,
    AzureResourceHealth,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Metric => "metric",
            SignalType::LogQuery => "log_query",
            SignalType::Custom => "custom",
            SignalType::AzureResourceHealth => "azure_resource_health",
        }
    }
}

/// Threshold comparison operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdOperator {
    #[default]
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "gte")]
    GreaterEqual,
    #[serde(rename = "lte")]
    LessEqual,
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "neq")]
    NotEqual,
}

/// Value bands per health state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthThreshold {
    pub healthy_min: Option<f64>,
    pub healthy_max: Option<f64>,
    pub degraded_min: Option<f64>,
    pub degraded_max: Option<f64>,
    pub unhealthy_min: Option<f64>,
    pub unhealthy_max: Option<f64>,
    #[serde(default)]
    pub operator: ThresholdOperator,
}

impl HealthThreshold {
    /// Bands for a metric where higher values are worse
    fn rising(healthy_max: f64, degraded_max: f64) -> Self {
        Self {
            healthy_min: Some(0.0),
            healthy_max: Some(healthy_max),
            degraded_min: Some(healthy_max),
            degraded_max: Some(degraded_max),
            unhealthy_min: Some(degraded_max),
            ..Self::default()
        }
    }
}

/// A health signal definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSignal {
    pub name: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub display_name: String,
    pub description: String,
    pub thresholds: HealthThreshold,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Weight in health aggregation (0.0 - 1.0)
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

impl HealthSignal {
    pub fn new(
        name: impl Into<String>,
        signal_type: SignalType,
        display_name: impl Into<String>,
        description: impl Into<String>,
        thresholds: HealthThreshold,
    ) -> Self {
        Self {
            name: name.into(),
            signal_type,
            display_name: display_name.into(),
            description: description.into(),
            thresholds,
            enabled: default_enabled(),
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn cpu_utilization() -> Self {
        Self::new(
            "cpu_utilization",
            SignalType::Metric,
            "CPU Utilization",
            "CPU utilization percentage. High values indicate compute pressure.",
            HealthThreshold::rising(70.0, 85.0),
        )
        .with_weight(0.25)
    }

    pub fn memory_utilization() -> Self {
        Self::new(
            "memory_utilization",
            SignalType::Metric,
            "Memory Utilization",
            "Memory utilization percentage. High values indicate memory pressure.",
            HealthThreshold::rising(80.0, 90.0),
        )
        .with_weight(0.25)
    }

    pub fn disk_space_available() -> Self {
        Self::new(
            "disk_space_available",
            SignalType::Metric,
            "Disk Space Available",
            "Available disk space percentage",
            HealthThreshold {
                healthy_min: Some(20.0),
                degraded_min: Some(10.0),
                degraded_max: Some(20.0),
                unhealthy_max: Some(10.0),
                ..HealthThreshold::default()
            },
        )
        .with_weight(0.15)
    }

    pub fn network_latency() -> Self {
        Self::new(
            "network_latency",
            SignalType::Metric,
            "Network Latency (ms)",
            "Average network latency in milliseconds",
            HealthThreshold::rising(100.0, 500.0),
        )
        .with_weight(0.15)
    }

    pub fn response_time_p95() -> Self {
        Self::new(
            "response_time_p95",
            SignalType::Metric,
            "Response Time (p95)",
            "95th percentile response time in milliseconds",
            HealthThreshold::rising(500.0, 1000.0),
        )
        .with_weight(0.25)
    }

    pub fn error_rate() -> Self {
        Self::new(
            "error_rate",
            SignalType::Metric,
            "Error Rate (%)",
            "Percentage of requests that result in errors",
            HealthThreshold::rising(1.0, 5.0),
        )
        .with_weight(0.30)
    }

    pub fn availability() -> Self {
        Self::new(
            "availability",
            SignalType::Metric,
            "Availability (%)",
            "Service availability percentage (uptime)",
            HealthThreshold {
                healthy_min: Some(99.5),
                healthy_max: Some(100.0),
                degraded_min: Some(99.0),
                degraded_max: Some(99.5),
                unhealthy_max: Some(99.0),
                ..HealthThreshold::default()
            },
        )
        .with_weight(0.30)
    }

    pub fn request_rate() -> Self {
        Self::new(
            "request_rate_rps",
            SignalType::Metric,
            "Request Rate (RPS)",
            "Requests per second",
            HealthThreshold::rising(1000.0, 2000.0),
        )
        .with_weight(0.15)
    }

    pub fn db_connection_pool() -> Self {
        Self::new(
            "db_connection_pool_utilization",
            SignalType::Metric,
            "DB Connection Pool Utilization (%)",
            "Percentage of available database connections in use",
            HealthThreshold::rising(70.0, 85.0),
        )
        .with_weight(0.25)
    }

    pub fn db_query_latency() -> Self {
        Self::new(
            "db_query_latency_p95",
            SignalType::Metric,
            "DB Query Latency (p95 ms)",
            "95th percentile database query execution time",
            HealthThreshold::rising(100.0, 500.0),
        )
        .with_weight(0.25)
    }

    pub fn db_deadlocks() -> Self {
        Self::new(
            "db_deadlocks",
            SignalType::Metric,
            "DB Deadlocks",
            "Number of database deadlocks detected",
            HealthThreshold {
                healthy_min: Some(0.0),
                healthy_max: Some(0.0),
                degraded_min: Some(1.0),
                degraded_max: Some(5.0),
                unhealthy_min: Some(5.0),
                ..HealthThreshold::default()
            },
        )
        .with_weight(0.20)
    }

    /// Domain-specific metric with a healthy and a degraded floor
    pub fn custom_business_metric(
        metric_name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        healthy_threshold: f64,
        degraded_threshold: f64,
        weight: f64,
    ) -> Self {
        Self::new(
            metric_name,
            SignalType::Custom,
            display_name,
            description,
            HealthThreshold {
                healthy_min: Some(healthy_threshold),
                degraded_min: Some(degraded_threshold),
                ..HealthThreshold::default()
            },
        )
        .with_weight(weight)
    }
}

#[derive(Serialize)]
struct SignalExport<'a> {
    signals: Vec<&'a HealthSignal>,
}

/// Signal definitions keyed by lookup key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalCatalog {
    signals: BTreeMap<String, HealthSignal>,
}

impl SignalCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, signal: HealthSignal) {
        self.signals.insert(key.into(), signal);
    }

    pub fn get(&self, key: &str) -> Option<&HealthSignal> {
        self.signals.get(key)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HealthSignal)> {
        self.signals.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge another catalog; its entries win on key clashes
    pub fn merge(mut self, other: SignalCatalog) -> Self {
        self.signals.extend(other.signals);
        self
    }

    pub fn vm() -> Self {
        Self::from_pairs([
            ("cpu", HealthSignal::cpu_utilization()),
            ("memory", HealthSignal::memory_utilization()),
            ("disk", HealthSignal::disk_space_available()),
            ("network_latency", HealthSignal::network_latency()),
        ])
    }

    pub fn web_service() -> Self {
        Self::from_pairs([
            ("response_time", HealthSignal::response_time_p95()),
            ("error_rate", HealthSignal::error_rate()),
            ("availability", HealthSignal::availability()),
            ("request_rate", HealthSignal::request_rate()),
            ("cpu", HealthSignal::cpu_utilization()),
            ("memory", HealthSignal::memory_utilization()),
        ])
    }

    pub fn database() -> Self {
        Self::from_pairs([
            ("connection_pool", HealthSignal::db_connection_pool()),
            ("query_latency", HealthSignal::db_query_latency()),
            ("deadlocks", HealthSignal::db_deadlocks()),
            ("cpu", HealthSignal::cpu_utilization()),
            ("memory", HealthSignal::memory_utilization()),
        ])
    }

    pub fn app_service() -> Self {
        Self::from_pairs([
            ("response_time", HealthSignal::response_time_p95()),
            ("error_rate", HealthSignal::error_rate()),
            ("availability", HealthSignal::availability()),
            ("cpu", HealthSignal::cpu_utilization()),
            ("memory", HealthSignal::memory_utilization()),
        ])
    }

    /// Web service and database signals together
    pub fn standard() -> Self {
        Self::web_service().merge(Self::database())
    }

    fn from_pairs<const N: usize>(pairs: [(&str, HealthSignal); N]) -> Self {
        Self {
            signals: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// Definitions for an entity's signal references, keyed by role
    ///
    /// Each reference is looked up by its signal id first, then by its role
    /// name. References matching neither are omitted.
    pub fn definitions_for(&self, entity: &Entity) -> BTreeMap<String, HealthSignal> {
        entity
            .signals
            .iter()
            .filter_map(|(role, signal_id)| {
                self.get(signal_id)
                    .or_else(|| self.get(role))
                    .map(|signal| (role.clone(), signal.clone()))
            })
            .collect()
    }

    /// JSON document `{"signals": [...]}`
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        let export = SignalExport {
            signals: self.signals.values().collect(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
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
