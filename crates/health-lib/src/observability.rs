//! Observability infrastructure for health model reporting
//!
//! Provides:
//! - Prometheus metrics (entities per state, workload state, refresh latency and errors)
//! - Structured logging with tracing

use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_gauge,
    register_int_gauge_vec, Gauge, Histogram, IntCounter, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::aggregate::HealthSummary;
use crate::models::HealthState;

/// Histogram buckets for refresh latency (in seconds)
const REFRESH_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

const STATES: [HealthState; 4] = [
    HealthState::Healthy,
    HealthState::Degraded,
    HealthState::Unhealthy,
    HealthState::Unknown,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ReportMetricsInner> = OnceLock::new();

struct ReportMetricsInner {
    entities_by_state: IntGaugeVec,
    workload_state: IntGauge,
    refresh_latency_seconds: Histogram,
    refresh_errors: IntCounter,
    last_refresh_timestamp: Gauge,
}

impl ReportMetricsInner {
    fn new() -> Self {
        Self {
            entities_by_state: register_int_gauge_vec!(
                "health_model_entities",
                "Number of entities per health state in the latest snapshot",
                &["state"]
            )
            .expect("Failed to register entities_by_state"),

            workload_state: register_int_gauge!(
                "health_model_workload_state",
                "Workload health (0=healthy, 1=degraded, 2=unhealthy, 3=unknown)"
            )
            .expect("Failed to register workload_state"),

            refresh_latency_seconds: register_histogram!(
                "health_model_refresh_latency_seconds",
                "Time spent fetching health states and building the report",
                REFRESH_BUCKETS.to_vec()
            )
            .expect("Failed to register refresh_latency_seconds"),

            refresh_errors: register_int_counter!(
                "health_model_refresh_errors_total",
                "Total number of failed health refreshes"
            )
            .expect("Failed to register refresh_errors"),

            last_refresh_timestamp: register_gauge!(
                "health_model_last_refresh_timestamp_seconds",
                "Unix time of the last successful refresh"
            )
            .expect("Failed to register last_refresh_timestamp"),
        }
    }
}

/// Numeric gauge value of a health state, ordered by severity
pub fn state_value(state: HealthState) -> i64 {
    match state {
        HealthState::Healthy => 0,
        HealthState::Degraded => 1,
        HealthState::Unhealthy => 2,
        HealthState::Unknown => 3,
    }
}

/// Report metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct ReportMetrics {
    _private: (),
}

impl Default for ReportMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportMetrics {
    /// Create a metrics handle (registers global metrics on first call)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ReportMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ReportMetricsInner {
        GLOBAL_METRICS.get_or_init(ReportMetricsInner::new)
    }

    /// Publish per-state entity counts
    pub fn record_summary(&self, summary: &HealthSummary) {
        for state in STATES {
            self.inner()
                .entities_by_state
                .with_label_values(&[&state.as_str().to_lowercase()])
                .set(summary.count(state) as i64);
        }
    }

    pub fn set_workload_state(&self, state: HealthState) {
        self.inner().workload_state.set(state_value(state));
    }

    pub fn observe_refresh_latency(&self, duration_secs: f64) {
        self.inner().refresh_latency_seconds.observe(duration_secs);
    }

    pub fn inc_refresh_errors(&self) {
        self.inner().refresh_errors.inc();
    }

    pub fn set_last_refresh(&self, unix_secs: f64) {
        self.inner().last_refresh_timestamp.set(unix_secs);
    }
}

/// Structured logger for health model events
#[derive(Clone)]
pub struct StructuredLogger {
    model_name: String,
}

impl StructuredLogger {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, entity_count: usize) {
        info!(
            event = "exporter_started",
            model = %self.model_name,
            version = %version,
            entities = entity_count,
            "Health exporter started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "exporter_shutdown",
            model = %self.model_name,
            reason = %reason,
            "Health exporter shutting down"
        );
    }

    /// Log a completed refresh
    pub fn log_refresh(&self, summary: &HealthSummary, workload: HealthState, duration_secs: f64) {
        info!(
            event = "health_refreshed",
            model = %self.model_name,
            workload_state = %workload,
            total = summary.total_entities,
            healthy = summary.healthy_count,
            degraded = summary.degraded_count,
            unhealthy = summary.unhealthy_count,
            unknown = summary.unknown_count,
            duration_secs = duration_secs,
            "Health snapshot refreshed"
        );
    }

    pub fn log_refresh_failed(&self, error: &str) {
        warn!(
            event = "health_refresh_failed",
            model = %self.model_name,
            error = %error,
            "Health refresh failed, keeping previous report"
        );
    }

    /// Log an entity moving between health states
    pub fn log_state_change(&self, entity_id: &str, previous: HealthState, current: HealthState) {
        if state_value(current) > state_value(previous) && current != HealthState::Unknown {
            warn!(
                event = "entity_state_changed",
                model = %self.model_name,
                entity_id = %entity_id,
                previous = %previous,
                current = %current,
                "Entity health worsened"
            );
        } else {
            info!(
                event = "entity_state_changed",
                model = %self.model_name,
                entity_id = %entity_id,
                previous = %previous,
                current = %current,
                "Entity health changed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::health_summary;
    use crate::models::HealthRecord;
    use crate::snapshot::HealthSnapshot;

    #[test]
    fn test_report_metrics() {
        let metrics = ReportMetrics::new();
        let snapshot: HealthSnapshot = vec![
            HealthRecord::new("a", HealthState::Healthy),
            HealthRecord::new("b", HealthState::Unhealthy),
            HealthRecord::new("c", HealthState::Unhealthy),
        ]
        .into_iter()
        .collect();

        metrics.record_summary(&health_summary(&snapshot));
        metrics.set_workload_state(HealthState::Degraded);
        metrics.observe_refresh_latency(0.2);
        metrics.set_last_refresh(1_700_000_000.0);

        let inner = metrics.inner();
        assert_eq!(inner.entities_by_state.with_label_values(&["unhealthy"]).get(), 2);
        assert_eq!(inner.entities_by_state.with_label_values(&["unknown"]).get(), 0);
        assert_eq!(inner.workload_state.get(), 1);
    }

    #[test]
    fn test_state_values_order_by_severity() {
        assert!(state_value(HealthState::Healthy) < state_value(HealthState::Degraded));
        assert!(state_value(HealthState::Degraded) < state_value(HealthState::Unhealthy));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("E-Commerce Production");
        assert_eq!(logger.model_name, "E-Commerce Production");
        logger.log_state_change("api", HealthState::Healthy, HealthState::Unhealthy);
    }
}
