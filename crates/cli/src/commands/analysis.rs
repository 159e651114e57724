//! Dependency analysis and signal CLI commands
//!
//! These work from the model alone and never contact the API.

use anyhow::Result;
use colored::Colorize;
use health_lib::{critical_path, dependency_impact, HealthSignal, HealthThreshold, SignalCatalog};
use std::collections::BTreeMap;
use tabled::Tabled;

use super::Session;
use crate::output::{
    color_criticality, print_heading, print_info, print_json, print_table, print_warning,
    OutputFormat,
};

/// Row for affected services table
#[derive(Tabled)]
struct AffectedRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Criticality")]
    criticality: String,
    #[tabled(rename = "Type")]
    dependency_type: String,
}

/// Row for signal definitions table
#[derive(Tabled)]
struct SignalRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Signal")]
    name: String,
    #[tabled(rename = "Type")]
    signal_type: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Healthy")]
    healthy: String,
    #[tabled(rename = "Degraded")]
    degraded: String,
    #[tabled(rename = "Unhealthy")]
    unhealthy: String,
}

/// Show what breaks if an entity fails
pub fn show_impact(session: &Session, entity_id: &str) -> Result<()> {
    let graph = session.graph()?;
    let impact = dependency_impact(&graph, entity_id);

    match session.format {
        OutputFormat::Json => print_json(&impact)?,
        OutputFormat::Table => {
            print_heading("Dependency Impact", 50);
            let name = graph
                .entity(entity_id)
                .map(|e| e.name.as_str())
                .unwrap_or("not in model");
            println!("Failed entity:  {} ({})", entity_id.cyan(), name);
            println!("Severity:       {}", color_criticality(impact.impact_severity));
            println!();

            let rows: Vec<AffectedRow> = impact
                .affected_services
                .iter()
                .map(|a| AffectedRow {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    criticality: color_criticality(a.criticality),
                    dependency_type: a.dependency_type.to_string(),
                })
                .collect();
            print_table(rows, "No entities depend on this entity");
        }
    }

    Ok(())
}

/// Show the chain of critical and high dependencies below an entity
pub fn show_critical_path(session: &Session, start_id: &str) -> Result<()> {
    let graph = session.graph()?;
    let path = critical_path(&graph, start_id);

    match session.format {
        OutputFormat::Json => print_json(&path)?,
        OutputFormat::Table => {
            print_heading("Critical Path", 50);
            for (i, id) in path.iter().enumerate() {
                let name = graph.entity(id).map(|e| e.name.as_str()).unwrap_or("-");
                let arrow = if i == 0 { " " } else { "↳" };
                println!("{} {:>2}. {} ({})", arrow, i + 1, id.cyan(), name);
            }
            if !graph.contains(start_id) {
                println!();
                print_warning(&format!("Entity '{}' is not defined in the model", start_id));
                print_info("Use --start <entity> to trace from another entity");
            }
        }
    }

    Ok(())
}

fn format_band(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("{} - {}", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => "-".to_string(),
    }
}

fn signal_row(key: &str, signal: &HealthSignal) -> SignalRow {
    let HealthThreshold {
        healthy_min,
        healthy_max,
        degraded_min,
        degraded_max,
        unhealthy_min,
        unhealthy_max,
        ..
    } = signal.thresholds;

    SignalRow {
        key: key.to_string(),
        name: signal.display_name.clone(),
        signal_type: signal.signal_type.as_str().to_string(),
        weight: format!("{:.2}", signal.weight),
        healthy: format_band(healthy_min, healthy_max),
        degraded: format_band(degraded_min, degraded_max),
        unhealthy: format_band(unhealthy_min, unhealthy_max),
    }
}

/// List signal definitions, for the whole catalog or one entity
pub fn show_signals(session: &Session, entity_id: Option<&str>) -> Result<()> {
    let catalog = SignalCatalog::standard();

    let definitions: Vec<(String, HealthSignal)> = match entity_id {
        Some(id) => {
            let graph = session.graph()?;
            match graph.entity(id) {
                Some(entity) => catalog.definitions_for(entity).into_iter().collect(),
                None => {
                    print_warning(&format!("Entity '{}' is not defined in the model", id));
                    Vec::new()
                }
            }
        }
        None => catalog
            .iter()
            .map(|(key, signal)| (key.to_string(), signal.clone()))
            .collect(),
    };

    match session.format {
        OutputFormat::Json => {
            let map: BTreeMap<&str, &HealthSignal> = definitions
                .iter()
                .map(|(key, signal)| (key.as_str(), signal))
                .collect();
            print_json(&map)?;
        }
        OutputFormat::Table => {
            match entity_id {
                Some(id) => print_heading(&format!("Signals: {}", id), 60),
                None => print_heading("Signal Catalog", 60),
            }
            let rows: Vec<SignalRow> = definitions
                .iter()
                .map(|(key, signal)| signal_row(key, signal))
                .collect();
            print_table(rows, "No signal definitions found");
        }
    }

    Ok(())
}
