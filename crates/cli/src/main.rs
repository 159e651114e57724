//! Health Model CLI
//!
//! A command-line tool for querying entity health, summarizing a health
//! model and analyzing dependency impact.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analysis, health, model, report, ApiArgs, ModelSource, SampleModel, Session};
use health_lib::client::{DEFAULT_TIMELINE_HOURS, DEFAULT_TIMELINE_INTERVAL_MINUTES};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_START: &str = health_lib::DEFAULT_CRITICAL_PATH_START;

/// Health Model CLI
#[derive(Parser)]
#[command(name = "hm")]
#[command(author, version, about = "CLI for Azure Monitor health models", long_about = None)]
pub struct Cli {
    /// Azure subscription ID
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID", global = true)]
    pub subscription_id: Option<String>,

    /// Azure resource group of the health model
    #[arg(long, env = "AZURE_RESOURCE_GROUP", global = true)]
    pub resource_group: Option<String>,

    /// Health model name
    #[arg(long, env = "HEALTH_MODEL_NAME", global = true)]
    pub health_model: Option<String>,

    /// Bearer token for the management API
    #[arg(long, env = "AZURE_AUTH_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Management API base URL
    #[arg(long, env = "HM_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Health model document (JSON)
    #[arg(long, env = "HM_MODEL_FILE", conflicts_with = "sample", global = true)]
    pub model_file: Option<PathBuf>,

    /// Use a built-in sample model
    #[arg(long, value_enum, global = true)]
    pub sample: Option<SampleModel>,

    /// Read health records from a snapshot file instead of the API
    #[arg(long, env = "HM_SNAPSHOT", global = true)]
    pub snapshot: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show overall workload health
    Status,

    /// List health of all entities
    Entities,

    /// Show health of one entity
    Entity {
        /// Entity ID
        id: String,
    },

    /// Show health history of one entity
    Timeline {
        /// Entity ID
        id: String,

        /// Hours of history to show
        #[arg(
            long,
            default_value_t = DEFAULT_TIMELINE_HOURS,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        hours: u32,

        /// Minutes between data points
        #[arg(long, default_value_t = DEFAULT_TIMELINE_INTERVAL_MINUTES)]
        interval: u32,
    },

    /// Show health counts and percentages per state
    Summary {
        /// Count model entities without health data as unknown
        #[arg(long)]
        complete: bool,
    },

    /// Show the health tree of the model
    Tree,

    /// Show what is affected if an entity fails
    Impact {
        /// Entity ID
        id: String,
    },

    /// Trace critical and high dependencies below an entity
    CriticalPath {
        /// Entity to start from
        #[arg(long, default_value = DEFAULT_START)]
        start: String,
    },

    /// List signal definitions
    Signals {
        /// Only the signals referenced by this entity
        entity: Option<String>,
    },

    /// Build a full health report
    Report {
        /// Output file path
        #[arg(long, short)]
        output: Option<String>,

        /// Entity the critical path starts from
        #[arg(long, default_value = DEFAULT_START)]
        start: String,
    },

    /// Health model document commands
    #[command(subcommand)]
    Model(ModelCommands),
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Show entities and dependencies of the model
    Show,

    /// Export the model document
    Export {
        /// Output file path
        #[arg(long, short)]
        output: String,
    },

    /// Check that a model document is valid
    Validate {
        /// Model document to check
        file: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn session(cli: &Cli, file: &config::Config) -> Session {
    let model = match (&cli.model_file, cli.sample) {
        (Some(path), _) => ModelSource::File(path.clone()),
        (None, Some(sample)) => ModelSource::Sample(sample),
        (None, None) => match &file.model_file {
            Some(path) => ModelSource::File(PathBuf::from(path)),
            None => ModelSource::Sample(SampleModel::Ecommerce),
        },
    };

    Session {
        format: cli.format,
        model,
        snapshot: cli.snapshot.clone(),
        api: ApiArgs {
            subscription_id: config::pick(cli.subscription_id.clone(), file.subscription_id.as_ref()),
            resource_group: config::pick(cli.resource_group.clone(), file.resource_group.as_ref()),
            health_model_name: config::pick(cli.health_model.clone(), file.health_model_name.as_ref()),
            auth_token: cli.token.clone(),
            api_url: config::pick(cli.api_url.clone(), file.api_url.as_ref()),
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file_config = config::Config::load()?;
    let session = session(&cli, &file_config);

    match cli.command {
        Commands::Status => health::show_status(&session).await?,
        Commands::Entities => health::list_entities(&session).await?,
        Commands::Entity { id } => health::show_entity(&session, &id).await?,
        Commands::Timeline {
            id,
            hours,
            interval,
        } => health::show_timeline(&session, &id, hours, interval).await?,
        Commands::Summary { complete } => health::show_summary(&session, complete).await?,
        Commands::Tree => health::show_tree(&session).await?,
        Commands::Impact { id } => analysis::show_impact(&session, &id)?,
        Commands::CriticalPath { start } => analysis::show_critical_path(&session, &start)?,
        Commands::Signals { entity } => analysis::show_signals(&session, entity.as_deref())?,
        Commands::Report { output, start } => {
            report::health_report(&session, output.as_deref(), &start).await?
        }
        Commands::Model(model_cmd) => match model_cmd {
            ModelCommands::Show => model::show_model(&session)?,
            ModelCommands::Export { output } => model::export_model(&session, &output)?,
            ModelCommands::Validate { file } => model::validate_model(&file, session.format)?,
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
