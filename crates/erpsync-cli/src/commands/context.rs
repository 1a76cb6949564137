//! Shared wiring for commands that talk to the store or the remote ERP
//!
//! Loads the configuration, opens the local database and builds the HTTP
//! gateway and the sync orchestrator on top of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use erpsync_cache::{DatabasePool, SqliteLocalStore, SqliteSyncQueue};
use erpsync_core::config::Config;
use erpsync_gateway::HttpErpGateway;
use erpsync_sync::{LogNotificationService, SyncOrchestrator};

/// Config file to use: the `--config` argument, or the default location
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

/// Loads the configuration
///
/// An explicitly given file must exist and parse. The default file is
/// optional; built-in defaults are used when it is missing.
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, PathBuf)> {
    let path = resolve_config_path(explicit);
    let config = if explicit.is_some() {
        Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else {
        Config::load_or_default(&path)
    };
    Ok((config, path))
}

/// Everything a command needs to reach the local store and the remote ERP
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteLocalStore>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pool: DatabasePool,
}

impl AppContext {
    /// Loads and validates the configuration, then builds the components
    pub async fn open(explicit: Option<&Path>) -> Result<Self> {
        let (config, config_path) = load_config(explicit)?;
        info!(config_path = %config_path.display(), "Loaded configuration");

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!(
                "Invalid configuration ({}): {}",
                config_path.display(),
                messages.join("; ")
            );
        }

        let pool = DatabasePool::from_config(&config.database)
            .await
            .context("Failed to open local database")?;
        let store = Arc::new(SqliteLocalStore::new(pool.pool().clone()));
        let queue = Arc::new(SqliteSyncQueue::new(pool.pool().clone()));
        let gateway =
            Arc::new(HttpErpGateway::new(&config.gateway).context("Failed to create ERP client")?);

        let orchestrator = Arc::new(SyncOrchestrator::new(
            gateway,
            store.clone(),
            queue,
            Arc::new(LogNotificationService),
            config.retry_policy(),
        ));

        Ok(Self {
            config,
            store,
            orchestrator,
            pool,
        })
    }

    /// Closes the database so the WAL is checkpointed before exit
    pub async fn close(self) {
        self.pool.close().await;
    }
}
