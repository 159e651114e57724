//! Health exporter
//!
//! Periodically fetches health states for one health model, keeps the latest
//! report in memory and serves it with Prometheus metrics over HTTP.

pub mod api;
pub mod config;
pub mod refresh;

pub use api::{create_router, serve, AppState, LatestReport};
pub use config::ExporterConfig;
pub use refresh::{refresh, run_refresh_loop};
