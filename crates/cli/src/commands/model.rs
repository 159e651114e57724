//! Health model document CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use health_lib::EntityGraph;
use tabled::Tabled;

use super::Session;
use crate::output::{
    color_criticality, print_heading, print_json, print_success, print_table, print_warning,
    OutputFormat,
};

/// Row for entities table
#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Signals")]
    signals: usize,
}

/// Row for dependencies table
#[derive(Tabled)]
struct DependencyRow {
    #[tabled(rename = "Depends On")]
    source: String,
    #[tabled(rename = "Dependent")]
    target: String,
    #[tabled(rename = "Type")]
    dependency_type: String,
    #[tabled(rename = "Criticality")]
    criticality: String,
}

/// Show the model: identity, entities and dependencies
pub fn show_model(session: &Session) -> Result<()> {
    let graph = session.graph()?;

    match session.format {
        OutputFormat::Json => println!("{}", graph.to_json_pretty()?),
        OutputFormat::Table => {
            let info = graph.info();
            print_heading(&info.model_name, 60);
            println!("Model ID:     {}", info.model_id.cyan());
            if !info.description.is_empty() {
                println!("Description:  {}", info.description);
            }
            if !info.owner_team.is_empty() {
                println!("Owner:        {}", info.owner_team);
            }
            println!("Version:      {}", info.version);
            println!(
                "Modified:     {}",
                info.last_modified.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!();

            println!("{}", "Entities".bold());
            let rows: Vec<EntityRow> = graph
                .entities()
                .map(|e| EntityRow {
                    id: e.id.clone(),
                    name: e.name.clone(),
                    entity_type: e.entity_type.to_string(),
                    parent: e.parent_id.clone().unwrap_or_else(|| "-".to_string()),
                    signals: e.signals.len(),
                })
                .collect();
            print_table(rows, "No entities defined");
            println!();

            println!("{}", "Dependencies".bold());
            let rows: Vec<DependencyRow> = graph
                .dependencies()
                .iter()
                .map(|d| DependencyRow {
                    source: d.source_id.clone(),
                    target: d.target_id.clone(),
                    dependency_type: d.dependency_type.to_string(),
                    criticality: color_criticality(d.criticality),
                })
                .collect();
            print_table(rows, "No dependencies defined");
        }
    }

    Ok(())
}

/// Write the model document to a file
pub fn export_model(session: &Session, output: &str) -> Result<()> {
    let graph = session.graph()?;
    graph
        .export(output)
        .with_context(|| format!("Failed to export model to {}", output))?;

    print_success(&format!(
        "Model {} ({} entities, {} dependencies) exported to {}",
        graph.info().model_id,
        graph.entity_count(),
        graph.dependencies().len(),
        output
    ));
    Ok(())
}

/// References in the graph that point at entities it does not define
///
/// These are tolerated at load time; validation only reports them.
pub fn referential_gaps(graph: &EntityGraph) -> Vec<String> {
    let mut gaps = Vec::new();

    for entity in graph.entities() {
        if let Some(parent) = &entity.parent_id {
            if !graph.contains(parent) {
                gaps.push(format!("entity '{}' has unknown parent '{}'", entity.id, parent));
            }
        }
    }

    for dep in graph.dependencies() {
        for endpoint in [&dep.source_id, &dep.target_id] {
            if !graph.contains(endpoint) {
                gaps.push(format!(
                    "dependency {} -> {} references unknown entity '{}'",
                    dep.source_id, dep.target_id, endpoint
                ));
            }
        }
    }

    gaps
}

/// Check that a model document loads
pub fn validate_model(path: &str, format: OutputFormat) -> Result<()> {
    let graph = EntityGraph::load(path).with_context(|| format!("Invalid model {}", path))?;
    let gaps = referential_gaps(&graph);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "valid": true,
            "model_id": graph.info().model_id,
            "entities": graph.entity_count(),
            "dependencies": graph.dependencies().len(),
            "warnings": gaps,
        }))?,
        OutputFormat::Table => {
            print_success(&format!(
                "{} is valid: {} entities, {} dependencies",
                path,
                graph.entity_count(),
                graph.dependencies().len()
            ));
            for gap in &gaps {
                print_warning(gap);
            }
        }
    }

    Ok(())
}
