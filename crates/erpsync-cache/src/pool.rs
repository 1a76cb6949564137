//! Database connection pool management
//!
//! Wraps SQLx's `SqlitePool` with:
//! - Parent directory creation for file databases
//! - WAL journal mode and a busy timeout
//! - The embedded schema migration, applied on every open
//! - An in-memory mode for tests

use std::path::Path;
use std::time::Duration;

use erpsync_core::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

const MIGRATION: &str = include_str!("migrations/20261019_initial.sql");

/// Pool of SQLite connections backing the local store and the sync queue
///
/// File databases get up to 5 connections. In-memory databases get exactly
/// one, since every SQLite memory connection is its own database.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if missing) the database file at `db_path`
    ///
    /// # Errors
    ///
    /// `CacheError::ConnectionFailed` if the directory or connection cannot
    /// be created, `CacheError::MigrationFailed` if the schema cannot be
    /// applied.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to connect to database at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        Self::migrate(&pool).await?;
        tracing::info!(path = %db_path.display(), "Local store opened");

        Ok(Self { pool })
    }

    /// Opens the database named by the `database` config section
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, CacheError> {
        Self::new(&config.path).await
    }

    /// Creates a private in-memory database
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("Failed to create in-memory database: {}", e))
            })?;

        Self::migrate(&pool).await?;
        tracing::debug!("In-memory local store initialized");

        Ok(Self { pool })
    }

    /// Returns a reference to the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every connection, flushing the WAL
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), CacheError> {
        sqlx::raw_sql(MIGRATION)
            .execute(pool)
            .await
            .map_err(|e| CacheError::MigrationFailed(format!("Initial schema: {}", e)))?;
        tracing::debug!("Schema migration applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_has_schema() {
        let db = DatabasePool::in_memory().await.unwrap();
        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(db.pool())
                .await
                .unwrap();
        assert!(tables.contains(&"local_records".to_string()));
        assert!(tables.contains(&"collection_revisions".to_string()));
        assert!(tables.contains(&"sync_queue".to_string()));
    }

    #[tokio::test]
    async fn test_file_database_creates_directories_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("erpsync.db");

        let db = DatabasePool::new(&path).await.unwrap();
        db.close().await;
        assert!(path.exists());

        // Migration is idempotent
        let reopened = DatabasePool::new(&path).await.unwrap();
        reopened.close().await;
    }
}
