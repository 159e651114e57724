//! Health state CLI commands

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use colored::Colorize;
use health_lib::{
    health_summary, EntityGraph, HealthRecord, HealthState, HealthTree, TreeNode,
};
use std::collections::HashSet;
use tabled::Tabled;

use super::Session;
use crate::output::{
    color_state, format_percent, format_timestamp, print_heading, print_info, print_json,
    print_table, print_warning, state_marker, OutputFormat,
};

/// Row for the entities table
#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity")]
    entity_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Updated")]
    timestamp: String,
}

/// Row for the timeline table
#[derive(Tabled)]
struct TimelineRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "State")]
    state: String,
}

/// Row for the summary table
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Share")]
    share: String,
}

const STATES: [HealthState; 4] = [
    HealthState::Healthy,
    HealthState::Degraded,
    HealthState::Unhealthy,
    HealthState::Unknown,
];

/// Configured name, else reported name, else the id
fn display_name(graph: &EntityGraph, entity_id: &str, record: &HealthRecord) -> String {
    graph
        .entity(entity_id)
        .map(|e| e.name.clone())
        .or_else(|| record.entity_name.clone())
        .or_else(|| record.display_name().map(String::from))
        .unwrap_or_else(|| entity_id.to_string())
}

fn print_record(title: &str, name: &str, record: &HealthRecord) {
    print_heading(title, 50);
    if let Some(id) = &record.entity_id {
        println!("Entity:     {}", id.cyan());
    }
    println!("Name:       {}", name);
    println!("State:      {} {}", state_marker(record.state), color_state(record.state));
    println!("Code:       {}", record.state_code);
    println!("Color:      {}", record.state_color);
    println!("Updated:    {}", format_timestamp(record.timestamp.as_deref()));
    if !record.signals.is_empty() {
        println!("Signals:    {}", record.signals.len());
    }
    if let Some(error) = &record.error {
        println!();
        print_warning(&format!("Health data unavailable: {}", error));
    }
}

/// Show overall workload health
pub async fn show_status(session: &Session) -> Result<()> {
    let integration = session.integration()?;
    let record = integration.workload_health().await;

    match session.format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Table => {
            let name = match &record.entity_id {
                Some(id) => display_name(integration.graph(), id, &record),
                None => integration.graph().info().model_name.clone(),
            };
            print_record("Workload Health", &name, &record);
        }
    }

    Ok(())
}

/// List health of every entity the source reports
pub async fn list_entities(session: &Session) -> Result<()> {
    let integration = session.integration()?;
    let snapshot = integration.all_entities_health().await;

    match session.format {
        OutputFormat::Json => print_json(&snapshot)?,
        OutputFormat::Table => {
            let rows: Vec<EntityRow> = snapshot
                .iter()
                .map(|(id, record)| EntityRow {
                    entity_id: id.to_string(),
                    name: display_name(integration.graph(), id, record),
                    state: color_state(record.state),
                    color: record.state_color.to_string(),
                    timestamp: format_timestamp(record.timestamp.as_deref()),
                })
                .collect();
            let total = rows.len();
            print_table(rows, "No health data found");
            if total > 0 {
                println!("\nTotal: {} entities", total);
            }
        }
    }

    Ok(())
}

/// Show current health of one entity
pub async fn show_entity(session: &Session, entity_id: &str) -> Result<()> {
    let integration = session.integration()?;
    if !integration.graph().contains(entity_id) {
        print_warning(&format!("Entity '{}' is not defined in the model", entity_id));
    }
    let record = integration.entity_health(entity_id).await;

    match session.format {
        OutputFormat::Json => print_json(&record)?,
        OutputFormat::Table => {
            let name = display_name(integration.graph(), entity_id, &record);
            print_record("Entity Health", &name, &record);
        }
    }

    Ok(())
}

/// Show health history of one entity
pub async fn show_timeline(
    session: &Session,
    entity_id: &str,
    hours: u32,
    interval_minutes: u32,
) -> Result<()> {
    let integration = session.integration()?;
    let end = Utc::now();
    let start = timeline_start(end, hours)?;
    let timeline = integration
        .entity_timeline(entity_id, start, end, interval_minutes)
        .await;

    match session.format {
        OutputFormat::Json => print_json(&timeline)?,
        OutputFormat::Table => {
            print_heading(&format!("Health Timeline: {}", entity_id), 50);
            println!("Window:     last {}h, every {}m", hours, interval_minutes);
            println!();

            let rows: Vec<TimelineRow> = timeline
                .iter()
                .map(|r| TimelineRow {
                    timestamp: format_timestamp(r.timestamp.as_deref()),
                    state: format!("{} {}", state_marker(r.state), color_state(r.state)),
                })
                .collect();
            print_table(rows, "No timeline data for this entity");
        }
    }

    Ok(())
}

/// Start of a window of `hours` ending at `end`
fn timeline_start(end: DateTime<Utc>, hours: u32) -> Result<DateTime<Utc>> {
    Duration::try_hours(i64::from(hours))
        .and_then(|window| end.checked_sub_signed(window))
        .with_context(|| format!("--hours {} is out of range", hours))
}

/// Show the health summary
///
/// With `complete`, entities the source did not report count as unknown.
pub async fn show_summary(session: &Session, complete: bool) -> Result<()> {
    let integration = session.integration()?;
    let mut snapshot = integration.all_entities_health().await;
    if complete {
        snapshot = snapshot.completed_for(integration.graph());
    }
    let summary = health_summary(&snapshot);

    match session.format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Table => {
            print_heading("Health Summary", 50);
            println!("Model:      {}", integration.graph().info().model_name.cyan());
            println!("Entities:   {}", summary.total_entities);
            println!();

            let rows: Vec<SummaryRow> = STATES
                .iter()
                .map(|&state| SummaryRow {
                    state: color_state(state),
                    count: summary.count(state),
                    share: format_percent(*summary.health_percentages.get(state)),
                })
                .collect();
            print_table(rows, "No entities");

            for state in STATES {
                let members = summary.entities_by_state.get(state);
                if members.is_empty() || state == HealthState::Healthy {
                    continue;
                }
                println!();
                println!("{} {}", state_marker(state), state.as_str().bold());
                for member in members {
                    println!("  - {} ({})", member.display_name, member.entity_id.dimmed());
                }
            }
        }
    }

    Ok(())
}

/// Show the health tree
pub async fn show_tree(session: &Session) -> Result<()> {
    let integration = session.integration()?;
    let tree = integration.health_tree().await;

    match session.format {
        OutputFormat::Json => print_json(&tree)?,
        OutputFormat::Table => {
            print_heading(&format!("Health Tree: {}", integration.graph().info().model_name), 60);
            if tree.is_empty() {
                print_warning("The model has no entities");
                return Ok(());
            }
            for line in render_tree(&tree) {
                println!("{}", line);
            }
            print_info("Dependencies: `hm impact <entity>` and `hm critical-path`");
        }
    }

    Ok(())
}

/// Indented lines following `parent_id`
///
/// Entities whose parent is missing from the tree are top level. Nodes
/// caught in a parent cycle are printed once at top level.
fn render_tree(tree: &HealthTree) -> Vec<String> {
    let mut lines = Vec::new();
    let mut visited = HashSet::new();

    let is_top = |node: &TreeNode| match &node.parent_id {
        Some(parent) => !tree.contains_key(parent),
        None => true,
    };

    let top: Vec<&str> = tree
        .iter()
        .filter(|(_, node)| is_top(node))
        .map(|(id, _)| id)
        .collect();
    for id in top {
        render_node(tree, id, 0, &mut visited, &mut lines);
    }

    let leftover: Vec<&str> = tree
        .keys()
        .filter(|id| !visited.contains(*id))
        .collect();
    for id in leftover {
        render_node(tree, id, 0, &mut visited, &mut lines);
    }

    lines
}

fn render_node<'a>(
    tree: &'a HealthTree,
    id: &'a str,
    depth: usize,
    visited: &mut HashSet<&'a str>,
    lines: &mut Vec<String>,
) {
    if !visited.insert(id) {
        return;
    }
    let Some(node) = tree.get(id) else {
        return;
    };

    lines.push(format!(
        "{}{} {} ({}) {}",
        "  ".repeat(depth),
        state_marker(node.state),
        node.name,
        node.entity_type,
        color_state(node.state),
    ));

    for (child_id, child) in tree.iter() {
        if child.parent_id.as_deref() == Some(id) {
            render_node(tree, child_id, depth + 1, visited, lines);
        }
    }
}
