//! Geodrill CLI - Command-line interface
//!
//! Drives the drill-down controller from the terminal over a fixture
//! dataset directory, rendering layers as console output.

mod backend;
mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "geodrill", version, about = "Hierarchical drill-down map navigation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Navigate a fixture dataset interactively (or via --script)
    Drill {
        /// Directory containing fixture JSON files
        #[arg(value_name = "DIR")]
        fixtures: PathBuf,

        /// Semicolon-separated commands to run instead of reading stdin,
        /// e.g. "drill 10 District Ten; drill S1 North; back; stats"
        #[arg(long)]
        script: Option<String>,

        /// Lower bound of the medium choropleth bucket
        #[arg(long, default_value_t = 25)]
        medium: u64,

        /// Lower bound of the high choropleth bucket
        #[arg(long, default_value_t = 100)]
        high: u64,

        /// Start with name/count labels hidden
        #[arg(long)]
        no_labels: bool,
    },

    /// Validate fixture files: decode every boundary record and report
    Inspect {
        /// Directory containing fixture JSON files
        #[arg(value_name = "DIR")]
        fixtures: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Drill {
            fixtures,
            script,
            medium,
            high,
            no_labels,
        } => commands::drill::run(&fixtures, script.as_deref(), medium, high, no_labels).await,
        Commands::Inspect { fixtures } => commands::inspect::run(&fixtures),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
