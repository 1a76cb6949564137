//! erpsync Cache - Local store persistence
//!
//! SQLite-based storage for:
//! - Local copies of stock, ledger, invoice and quote records
//! - Per-entity collection revisions
//! - The sync queue of mutations awaiting replay
//!
//! ## Architecture
//!
//! This crate implements the `ILocalStore`, `ICollectionSource` and
//! `ISyncQueue` ports from `erpsync-core` using SQLite as the storage
//! backend. It is a driven (secondary) adapter in the hexagonal
//! architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteLocalStore`] - Local records and revisions
//! - [`SqliteSyncQueue`] - FIFO sync queue
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use erpsync_cache::{DatabasePool, SqliteLocalStore, SqliteSyncQueue};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/erpsync/erpsync.db")).await?;
//! let store = SqliteLocalStore::new(pool.pool().clone());
//! let queue = SqliteSyncQueue::new(pool.pool().clone());
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod queue;
pub mod repository;

pub use pool::DatabasePool;
pub use queue::SqliteSyncQueue;
pub use repository::SqliteLocalStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization or deserialization of domain types failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A queue item in a transient status was handed to the store
    #[error("Queue status '{0}' is never persisted")]
    TransientStatus(String),

    /// The queue item to update does not exist
    #[error("Queue item not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}

/// Parse a DateTime<Utc> from an ISO 8601 string
pub(crate) fn parse_datetime(s: &str) -> Result<chrono::DateTime<chrono::Utc>, CacheError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| {
            CacheError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}
