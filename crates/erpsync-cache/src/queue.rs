//! SQLite implementation of ISyncQueue
//!
//! FIFO order comes from the `seq` autoincrement column, so two items
//! enqueued within the same clock tick still replay in insertion order.
//!
//! Items rest as `pending`, `failed` or `parked`. A drain claims a row by
//! moving it to `in_flight` with a lease deadline; the conditional UPDATE is
//! what keeps two drains (in this process or another one sharing the file)
//! from applying the same item. A committed item is removed instead of
//! stored. A claim left behind by a drain that never finished expires with
//! its lease and the row becomes replayable again.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use erpsync_core::domain::{QueueItemId, QueueItemStatus, SyncQueueItem};
use erpsync_core::ports::ISyncQueue;

use crate::{parse_datetime, CacheError};

/// SQLite-backed sync queue
#[derive(Debug, Clone)]
pub struct SqliteSyncQueue {
    pool: SqlitePool,
}

impl SqliteSyncQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row conversion
// ============================================================================

/// Reconstruct a SyncQueueItem from a database row
///
/// The item keeps its fields private, so the row is rebuilt as the item's
/// serde representation and deserialized. With `release_claims`, an
/// `in_flight` row is reported in the status it rested in before the claim:
/// `pending` if it was never attempted, `failed` otherwise.
fn queue_item_from_row(
    row: &SqliteRow,
    release_claims: bool,
) -> Result<SyncQueueItem, CacheError> {
    let seq: i64 = row.get("seq");
    let id: String = row.get("id");
    let entity: String = row.get("entity");
    let operation: String = row.get("operation");
    let payload_str: String = row.get("payload");
    let enqueued_at_str: String = row.get("enqueued_at");
    let attempts: i64 = row.get("attempts");
    let last_error: Option<String> = row.get("last_error");
    let next_attempt_at_str: Option<String> = row.get("next_attempt_at");
    let mut status: String = row.get("status");

    if release_claims && status == QueueItemStatus::InFlight.name() {
        status = resting_status(attempts).name().to_string();
    }

    let payload: serde_json::Value = serde_json::from_str(&payload_str).map_err(|e| {
        CacheError::SerializationError(format!("Queue payload for {}: {}", id, e))
    })?;
    let enqueued_at = parse_datetime(&enqueued_at_str)?;
    let next_attempt_at = next_attempt_at_str
        .as_deref()
        .map(parse_datetime)
        .transpose()?;

    let item_json = serde_json::json!({
        "id": id,
        "sequence": seq,
        "entity": entity,
        "operation": operation,
        "payload": payload,
        "enqueuedAt": enqueued_at,
        "attempts": attempts.max(0),
        "lastError": last_error,
        "nextAttemptAt": next_attempt_at,
        "status": status,
    });

    serde_json::from_value(item_json).map_err(|e| {
        CacheError::SerializationError(format!("Failed to reconstruct queue item: {}", e))
    })
}

fn resting_status(attempts: i64) -> QueueItemStatus {
    if attempts == 0 {
        QueueItemStatus::Pending
    } else {
        QueueItemStatus::Failed
    }
}

/// Statuses `update` and `enqueue` may write; `in_flight` is set by `claim`
fn ensure_persistable(status: QueueItemStatus) -> Result<(), CacheError> {
    match status {
        QueueItemStatus::Pending | QueueItemStatus::Failed | QueueItemStatus::Parked => Ok(()),
        QueueItemStatus::InFlight | QueueItemStatus::Committed => {
            Err(CacheError::TransientStatus(status.name().to_string()))
        }
    }
}

/// Inserts a queue row on `conn`, returning its sequence
///
/// Shared with the local store, which writes the row in the same
/// transaction as the local change it replays.
pub(crate) async fn insert_item(
    conn: &mut SqliteConnection,
    item: &SyncQueueItem,
) -> Result<i64, CacheError> {
    ensure_persistable(item.status())?;
    let payload = serde_json::to_string(item.payload())
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;

    let result = sqlx::query(
        "INSERT INTO sync_queue \
         (id, entity, operation, payload, enqueued_at, attempts, last_error, next_attempt_at, status) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(item.id().to_string())
    .bind(item.entity().name())
    .bind(item.operation().name())
    .bind(&payload)
    .bind(item.enqueued_at().to_rfc3339())
    .bind(i64::from(item.attempts()))
    .bind(item.last_error())
    .bind(item.next_attempt_at().map(|t| t.to_rfc3339()))
    .bind(item.status().name())
    .execute(&mut *conn)
    .await?;

    let sequence = result.last_insert_rowid();
    tracing::trace!(
        id = %item.id(),
        entity = %item.entity(),
        operation = %item.operation(),
        sequence,
        "Enqueued sync item"
    );
    Ok(sequence)
}

// ============================================================================
// ISyncQueue
// ============================================================================

#[async_trait::async_trait]
impl ISyncQueue for SqliteSyncQueue {
    async fn enqueue(&self, item: &SyncQueueItem) -> anyhow::Result<SyncQueueItem> {
        let mut conn = self.pool.acquire().await?;
        let sequence = insert_item(&mut *conn, item).await?;
        Ok(item.clone().with_sequence(sequence))
    }

    async fn pending(&self) -> anyhow::Result<Vec<SyncQueueItem>> {
        let rows = sqlx::query(
            "SELECT * FROM sync_queue \
             WHERE status IN ('pending', 'failed') \
             OR (status = 'in_flight' AND lease_until <= ?) \
             ORDER BY seq",
        )
        .bind(Utc::now().timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(|row| queue_item_from_row(row, true))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    async fn claim(
        &self,
        item: &SyncQueueItem,
        lease_until: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        if !item.status().is_replayable() {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE sync_queue SET status = 'in_flight', lease_until = ? \
             WHERE id = ? AND attempts = ? \
             AND (status = ? OR (status = 'in_flight' AND lease_until <= ?))",
        )
        .bind(lease_until.timestamp_millis())
        .bind(item.id().to_string())
        .bind(i64::from(item.attempts()))
        .bind(item.status().name())
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() == 1;
        tracing::trace!(id = %item.id(), claimed, "Claim sync item");
        Ok(claimed)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<SyncQueueItem>> {
        let rows = sqlx::query("SELECT * FROM sync_queue ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(|row| queue_item_from_row(row, false))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    async fn get(&self, id: &QueueItemId) -> anyhow::Result<Option<SyncQueueItem>> {
        let row = sqlx::query("SELECT * FROM sync_queue WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(queue_item_from_row(r, false)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, item: &SyncQueueItem) -> anyhow::Result<()> {
        ensure_persistable(item.status())?;

        let result = sqlx::query(
            "UPDATE sync_queue SET attempts = ?, last_error = ?, next_attempt_at = ?, status = ?, \
             lease_until = NULL WHERE id = ?",
        )
        .bind(i64::from(item.attempts()))
        .bind(item.last_error())
        .bind(item.next_attempt_at().map(|t| t.to_rfc3339()))
        .bind(item.status().name())
        .bind(item.id().to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CacheError::NotFound(item.id().to_string()).into());
        }

        tracing::trace!(
            id = %item.id(),
            status = %item.status(),
            attempts = item.attempts(),
            "Updated sync item"
        );
        Ok(())
    }

    async fn remove(&self, id: &QueueItemId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM sync_queue WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn len(&self) -> anyhow::Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_queue")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as usize)
    }
}
