//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod mapping;
mod plan;
mod resources;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "ancient")]
#[command(about = "Incubator legacy-data migration worker")]
#[command(version)]
pub struct Cli {
    /// Plan file path (overrides MIGRATE_CONFIG, default: config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Import legacy records into the platform API
    Run {
        /// Only import this resource (must be in the plan)
        #[arg(short, long)]
        resource: Option<String>,
        /// Limit creations per resource (0 = unlimited)
        #[arg(short, long, default_value = "0")]
        limit: usize,
        /// Partition and resolve but don't POST anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show what a run would import, per resource
    Plan,

    /// List the configured resources in plan order
    Resources,

    /// Show the foreign-key mapping the resolver would build for a resource
    Mapping {
        /// Resource type (e.g. startups)
        resource: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env(cli.config)?;

    match cli.command {
        Commands::Run {
            resource,
            limit,
            dry_run,
        } => run::cmd_run(&settings, resource.as_deref(), limit, dry_run).await,
        Commands::Plan => plan::cmd_plan(&settings).await,
        Commands::Resources => resources::cmd_resources(&settings).await,
        Commands::Mapping { resource } => mapping::cmd_mapping(&settings, &resource).await,
    }
}
