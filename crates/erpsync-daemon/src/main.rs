//! erpsync Daemon - Background connectivity and queue replay service
//!
//! This binary runs as a systemd user service and handles:
//! - Periodic reachability checks against the remote ERP gateway
//! - Replaying the sync queue at startup and whenever the remote comes back
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon wires the local store, the HTTP gateway and the sync
//! orchestrator together, then runs the connectivity monitor until a
//! `CancellationToken` is triggered by SIGTERM or SIGINT.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use erpsync_cache::{DatabasePool, SqliteLocalStore, SqliteSyncQueue};
use erpsync_core::config::{Config, LoggingConfig};
use erpsync_gateway::HttpErpGateway;
use erpsync_sync::{ConnectivityMonitor, LogNotificationService, SyncOrchestrator};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How long shutdown waits for a running queue drain to finish
const DRAIN_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "erpsyncd", version, about = "erpsync background daemon")]
struct Args {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// DaemonService
// ============================================================================

/// Owns the daemon's components and its shutdown token
struct DaemonService {
    /// Database pool, closed on shutdown
    db_pool: DatabasePool,
    monitor: ConnectivityMonitor,
    /// Token for signalling graceful shutdown
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Opens the database and builds the gateway, orchestrator and monitor
    async fn new(config: &Config, shutdown: CancellationToken) -> Result<Self> {
        let db_pool = DatabasePool::from_config(&config.database)
            .await
            .context("Failed to open database")?;
        let store = Arc::new(SqliteLocalStore::new(db_pool.pool().clone()));
        let queue = Arc::new(SqliteSyncQueue::new(db_pool.pool().clone()));
        let gateway =
            Arc::new(HttpErpGateway::new(&config.gateway).context("Failed to create ERP client")?);
        info!(base_url = %gateway.base_url(), "ERP gateway configured");

        let orchestrator = Arc::new(SyncOrchestrator::new(
            gateway.clone(),
            store,
            queue,
            Arc::new(LogNotificationService),
            config.retry_policy(),
        ));
        let monitor = ConnectivityMonitor::new(
            gateway,
            orchestrator,
            Duration::from_secs(config.connectivity.check_interval_secs),
        );

        Ok(Self {
            db_pool,
            monitor,
            shutdown,
        })
    }

    /// Runs the connectivity monitor until shutdown is requested
    async fn run(&self) -> Result<()> {
        tokio::select! {
            _ = self.monitor.run() => {}
            _ = self.shutdown.cancelled() => {
                info!("Shutdown signal received");
            }
        }

        // The monitor's drain runs as its own task and survives the select
        if !self.monitor.wait_for_drain(DRAIN_GRACE_PERIOD).await {
            warn!(
                grace_secs = DRAIN_GRACE_PERIOD.as_secs(),
                "Remaining queue items stay queued until the next start"
            );
        }
        self.db_pool.close().await;
        info!("Connectivity loop terminated");
        Ok(())
    }
}

// ============================================================================
// Configuration and tracing
// ============================================================================

/// Loads the configuration; an explicitly given file must exist and parse
fn load_config(explicit: Option<&Path>) -> Result<(Config, PathBuf)> {
    let (config, path) = match explicit {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, path.to_path_buf())
        }
        None => {
            let path = Config::default_path();
            (Config::load_or_default(&path), path)
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!(
            "Invalid configuration ({}): {}",
            path.display(),
            messages.join("; ")
        );
    }
    Ok((config, path))
}

/// `RUST_LOG` wins over the configured level
fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
}

fn init_tracing(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(logging))
        .with_target(true);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Tracing depends on the logging section, so the config comes first
    let (config, config_path) = load_config(args.config.as_deref())?;
    init_tracing(&config.logging);

    info!(config_path = %config_path.display(), "erpsync daemon starting (erpsyncd)");

    let shutdown_token = CancellationToken::new();

    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(&config, shutdown_token.clone()).await?;

    let result = service.run().await;

    match &result {
        Ok(()) => info!("erpsync daemon shut down gracefully"),
        Err(e) => error!(error = %e, "erpsync daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
