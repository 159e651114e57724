//! Health refresh loop
//!
//! Each cycle fetches one snapshot, builds the report from it and swaps it
//! into shared state. A failed fetch keeps the previous report.

use health_lib::{health_summary, workload_health, ApiError, HealthReport, HealthSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;

use crate::api::{AppState, LatestReport};

/// Run one refresh cycle
pub async fn refresh(state: &AppState) -> Result<(), ApiError> {
    let start = Instant::now();

    let snapshot = match state.integration.source().fetch_all().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            state.metrics.inc_refresh_errors();
            state.logger.log_refresh_failed(&e.to_string());
            return Err(e);
        }
    };

    let graph = state.integration.graph();
    let report = HealthReport::build(graph, &snapshot, &state.critical_path_start);
    let workload = workload_health(&snapshot);
    let summary = health_summary(&snapshot);

    let elapsed = start.elapsed().as_secs_f64();
    state.metrics.record_summary(&summary);
    state.metrics.set_workload_state(workload.state);
    state.metrics.observe_refresh_latency(elapsed);
    state
        .metrics
        .set_last_refresh(report.generated_at.timestamp_millis() as f64 / 1000.0);
    state.logger.log_refresh(&summary, workload.state, elapsed);

    let previous = state
        .publish(LatestReport {
            report,
            workload,
            snapshot: snapshot.clone(),
        })
        .await;

    if let Some(previous) = previous {
        for (entity_id, record) in snapshot.iter() {
            if let Some(before) = previous.snapshot.get(entity_id) {
                if before.state != record.state {
                    state.logger.log_state_change(entity_id, before.state, record.state);
                }
            }
        }
    }

    Ok(())
}

/// Refresh every `period` until shutdown is signalled
pub async fn run_refresh_loop(
    state: Arc<AppState>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!(interval_secs = period.as_secs(), "Starting health refresh loop");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // failures are logged and counted inside refresh
                let _ = refresh(&state).await;
            }
            _ = shutdown.recv() => {
                info!("Shutting down health refresh loop");
                break;
            }
        }
    }
}
