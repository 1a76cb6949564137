//! erpsync CLI - Command-line interface for erpsync
//!
//! Provides commands for:
//! - Triggering a remote sync and refreshing cached collections
//! - Reconciling local records against the remote ERP
//! - Inspecting and replaying the sync queue
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, queue::QueueCommand, reconcile::ReconcileCommand,
    refresh::RefreshCommand, sync::SyncCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "erpsync",
    version,
    about = "Reconcile and synchronize local ERP data with the remote ERP"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay queued changes, trigger the remote sync and refresh
    Sync(SyncCommand),
    /// Re-fetch every remote collection
    Refresh(RefreshCommand),
    /// Compare local records with the remote ERP
    Reconcile(ReconcileCommand),
    /// Inspect and replay the sync queue
    #[command(subcommand)]
    Queue(QueueCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(format, config).await,
        Commands::Refresh(cmd) => cmd.execute(format, config).await,
        Commands::Reconcile(cmd) => cmd.execute(format, config).await,
        Commands::Queue(cmd) => cmd.execute(format, config).await,
        Commands::Config(cmd) => cmd.execute(format, config).await,
    }
}
