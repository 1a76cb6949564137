//! erpsync Sync - Orchestration of the remote cache and the sync queue
//!
//! Provides:
//! - The query cache of remote collections, with explicit invalidation
//! - Manual sync (`sync_now`) and bulk refresh (`refresh_all`)
//! - Ordered, single-flight replay of the sync queue with retry backoff
//! - A connectivity monitor that replays the queue when the remote returns
//!
//! ## Modules
//!
//! - [`cache`] - Per-entity cache of fetched and normalized collections
//! - [`orchestrator`] - Entry points used by the CLI and the daemon
//! - [`replay`] - Queue drain with an in-flight gate
//! - [`connectivity`] - Online/offline transition detection
//! - [`notify`] - Notification service implementations

pub mod cache;
pub mod connectivity;
pub mod notify;
pub mod orchestrator;
pub mod replay;

pub use cache::QueryCache;
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor};
pub use notify::{LogNotificationService, RecordingNotificationService};
pub use orchestrator::SyncOrchestrator;
pub use replay::{DrainMode, DrainOutcome, DrainReport, QueueReplayer};

use erpsync_core::domain::DomainError;
use thiserror::Error;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// A call to the remote gateway failed
    #[error("Remote {operation} failed: {source:#}")]
    Gateway {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A local store or queue operation failed
    #[error("Local {operation} failed: {source:#}")]
    Store {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A mutation payload could not be applied locally
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A domain-level error propagated from erpsync-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl SyncError {
    pub(crate) fn gateway(operation: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| SyncError::Gateway { operation, source }
    }

    pub(crate) fn store(operation: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| SyncError::Store { operation, source }
    }
}
