//! Service Catalog Importer
//!
//! Mirrors portfolios shared from a hub account into the local account. Runs
//! as a Lambda function by default; `invoke` replays one notification from a
//! file for local use.

#![forbid(unsafe_code)]

mod aws;
mod commands;
mod handler;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scimp_common::{LogConfig, init_logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scimp")]
#[command(author, version, about = "Service Catalog portfolio importer")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Lambda runtime API (default)
    Serve,

    /// Run one import from a notification file
    ///
    /// The file holds the SNS envelope exactly as Lambda delivers it.
    Invoke {
        /// Path to the notification JSON
        #[arg(short, long)]
        event: PathBuf,

        /// Plan the writes without calling any mutating API
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration and where each value came from
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    let mut log_config = match command {
        Commands::Serve => LogConfig::from_env("info").for_lambda(),
        _ => LogConfig::from_env("warn").with_stderr(),
    };
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    match command {
        Commands::Serve => commands::serve::run().await,
        Commands::Invoke {
            event,
            dry_run,
            json,
        } => commands::invoke::run(&event, dry_run, json).await,
        Commands::Config { json } => commands::config::run(json),
    }
}
