//! Health report CLI command

use anyhow::{Context, Result};
use colored::Colorize;
use health_lib::HealthState;

use super::Session;
use crate::output::{
    color_state, format_percent, print_heading, print_info, print_json, print_success, OutputFormat,
};

/// Build the health report; write it to `output` or print it
pub async fn health_report(
    session: &Session,
    output: Option<&str>,
    critical_path_start: &str,
) -> Result<()> {
    let integration = session.integration()?;

    if let Some(path) = output {
        let report = integration
            .export_health_report(path, critical_path_start)
            .await
            .with_context(|| format!("Failed to export report to {}", path))?;
        print_success(&format!(
            "Health report for {} exported to {}",
            report.model, path
        ));
        return Ok(());
    }

    let report = integration.health_report(critical_path_start).await;

    match session.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_heading("Health Report", 50);
            println!("Model:         {}", report.model.cyan());
            println!(
                "Generated:     {}",
                report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!(
                "Entities:      {} reported, {} in model",
                report.summary.total_entities,
                report.health_tree.len()
            );
            println!();

            for state in [
                HealthState::Healthy,
                HealthState::Degraded,
                HealthState::Unhealthy,
                HealthState::Unknown,
            ] {
                println!(
                    "  {:<20} {:>4}  {}",
                    color_state(state),
                    report.summary.count(state),
                    format_percent(*report.summary.health_percentages.get(state)),
                );
            }

            println!();
            println!("{}", "Critical Path".bold());
            println!("{}", "-".repeat(50));
            println!("{}", report.critical_path.join(" -> "));
            println!();
            print_info("Use --output <file> to save the full report");
        }
    }

    Ok(())
}
