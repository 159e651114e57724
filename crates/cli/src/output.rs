//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use health_lib::{Criticality, HealthState};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a rounded table, or a notice when there are no rows
pub fn print_table<T: Tabled>(rows: Vec<T>, empty_message: &str) {
    if rows.is_empty() {
        print_warning(empty_message);
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a section heading with an underline
pub fn print_heading(title: &str, width: usize) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(width));
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color a health state the way its state color reads
pub fn color_state(state: HealthState) -> String {
    let label = state.as_str();
    match state {
        HealthState::Healthy => label.green().to_string(),
        HealthState::Degraded => label.yellow().to_string(),
        HealthState::Unhealthy => label.red().to_string(),
        HealthState::Unknown => label.dimmed().to_string(),
    }
}

/// Colored dot for a health state
pub fn state_marker(state: HealthState) -> String {
    match state {
        HealthState::Healthy => "●".green().to_string(),
        HealthState::Degraded => "●".yellow().to_string(),
        HealthState::Unhealthy => "●".red().to_string(),
        HealthState::Unknown => "○".dimmed().to_string(),
    }
}

pub fn color_criticality(criticality: Criticality) -> String {
    let label = criticality.as_str();
    match criticality {
        Criticality::Critical => label.red().bold().to_string(),
        Criticality::High => label.red().to_string(),
        Criticality::Medium => label.yellow().to_string(),
        Criticality::Low => label.green().to_string(),
    }
}

/// Format an RFC 3339 timestamp for display; other strings pass through
pub fn format_timestamp(ts: Option<&str>) -> String {
    match ts {
        Some(ts) => match chrono::DateTime::parse_from_rfc3339(ts) {
            Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Err(_) => ts.to_string(),
        },
        None => "-".to_string(),
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}
