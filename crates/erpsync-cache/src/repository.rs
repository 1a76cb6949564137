//! SQLite implementation of ILocalStore
//!
//! Local records are stored as canonical JSON, one row per
//! `(entity, record_key)`, where `record_key` is the composite key string
//! built from the record's own fields. Writing a record with an existing key
//! replaces it.
//!
//! A queued mutation (`record_mutation`) writes its local change and its
//! `sync_queue` row in one transaction.
//!
//! ## Type Mapping
//!
//! | Domain Type     | SQL Type | Strategy                                  |
//! |-----------------|----------|-------------------------------------------|
//! | EntityKind      | TEXT     | `EntityKind::name()` / `FromStr`          |
//! | Canonical record| TEXT     | serde_json serialization (camelCase)      |
//! | Revision        | INTEGER  | `u64` stored as `i64`                     |
//! | DateTime<Utc>   | TEXT     | ISO 8601 via `to_rfc3339()`               |

use chrono::Utc;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};

use erpsync_core::domain::{Collection, EntityKind, LocalChange, SyncQueueItem};
use erpsync_core::ports::{ICollectionSource, ILocalStore, RecordedMutation, VersionedCollection};

use crate::queue::insert_item;
use crate::CacheError;

/// SQLite-backed local copies of the four entity collections
#[derive(Debug, Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn payload_from_text(kind: EntityKind, payloads: Vec<String>) -> Result<Collection, CacheError> {
    let values = payloads
        .iter()
        .map(|text| serde_json::from_str::<Value>(text))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CacheError::SerializationError(format!("{} payload: {}", kind, e)))?;

    Collection::from_values(kind, values)
        .map_err(|e| CacheError::SerializationError(format!("{} record: {}", kind, e)))
}

const BUMP_REVISION: &str = "INSERT INTO collection_revisions (entity, revision) VALUES (?, 1) \
     ON CONFLICT(entity) DO UPDATE SET revision = revision + 1";

/// Upserts every record and bumps the kind's revision, on `conn`
async fn upsert_on(
    conn: &mut SqliteConnection,
    records: &Collection,
) -> Result<usize, CacheError> {
    let kind = records.kind();
    if records.is_empty() {
        return Ok(0);
    }

    let key = kind.composite_key();
    let values = records
        .to_values()
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
    let now = Utc::now().to_rfc3339();

    for value in &values {
        let payload = serde_json::to_string(value)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;
        sqlx::query(
            "INSERT INTO local_records (entity, record_key, payload, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(entity, record_key) DO UPDATE SET \
             payload = excluded.payload, updated_at = excluded.updated_at",
        )
        .bind(kind.name())
        .bind(key.key_of(value))
        .bind(&payload)
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }
    sqlx::query(BUMP_REVISION)
        .bind(kind.name())
        .execute(&mut *conn)
        .await?;

    tracing::trace!(entity = %kind, count = values.len(), "Upserted local records");
    Ok(values.len())
}

/// Deletes the records with the given keys, bumping the revision if any went
async fn delete_on(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    keys: &[String],
) -> Result<usize, CacheError> {
    let mut deleted = 0;
    for key in keys {
        let result =
            sqlx::query("DELETE FROM local_records WHERE entity = ? AND record_key = ?")
                .bind(kind.name())
                .bind(key)
                .execute(&mut *conn)
                .await?;
        deleted += result.rows_affected() as usize;
    }

    if deleted > 0 {
        sqlx::query(BUMP_REVISION)
            .bind(kind.name())
            .execute(&mut *conn)
            .await?;
    }

    tracing::trace!(entity = %kind, deleted, "Deleted local records");
    Ok(deleted)
}

// ============================================================================
// ILocalStore
// ============================================================================

#[async_trait::async_trait]
impl ILocalStore for SqliteLocalStore {
    async fn load_collection(&self, kind: EntityKind) -> anyhow::Result<Collection> {
        let payloads: Vec<String> = sqlx::query_scalar(
            "SELECT payload FROM local_records WHERE entity = ? ORDER BY record_key",
        )
        .bind(kind.name())
        .fetch_all(&self.pool)
        .await?;

        Ok(payload_from_text(kind, payloads)?)
    }

    async fn upsert_records(&self, records: &Collection) -> anyhow::Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let written = upsert_on(&mut *tx, records).await?;
        tx.commit().await?;
        Ok(written)
    }

    async fn delete_record(&self, kind: EntityKind, key: &str) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = delete_on(&mut *tx, kind, &[key.to_string()]).await?;
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn record_mutation(
        &self,
        change: &LocalChange,
        item: &SyncQueueItem,
    ) -> anyhow::Result<RecordedMutation> {
        let mut tx = self.pool.begin().await?;
        let affected = match change {
            LocalChange::Upsert(records) => upsert_on(&mut *tx, records).await?,
            LocalChange::Delete { kind, keys } => delete_on(&mut *tx, *kind, keys).await?,
        };
        let sequence = insert_item(&mut *tx, item).await?;
        tx.commit().await?;

        Ok(RecordedMutation {
            item: item.clone().with_sequence(sequence),
            affected,
        })
    }

    async fn revision(&self, kind: EntityKind) -> anyhow::Result<u64> {
        let revision: Option<i64> =
            sqlx::query_scalar("SELECT revision FROM collection_revisions WHERE entity = ?")
                .bind(kind.name())
                .fetch_optional(&self.pool)
                .await?;

        Ok(revision.map_or(0, |r| r.max(0) as u64))
    }
}

#[async_trait::async_trait]
impl ICollectionSource for SqliteLocalStore {
    async fn snapshot(&self, kind: EntityKind) -> anyhow::Result<VersionedCollection> {
        // Revision first: a write racing the load only makes the snapshot
        // look older than it is, never newer.
        let revision = self.revision(kind).await?;
        let collection = self.load_collection(kind).await?;
        Ok(VersionedCollection::new(revision, collection))
    }
}
