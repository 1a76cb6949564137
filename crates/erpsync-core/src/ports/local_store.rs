//! Local store and sync queue ports (driven/secondary ports)
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific.
//! - Every write to a local collection bumps that kind's revision, which is
//!   what lets reconciliation skip unchanged entity kinds.
//! - The queue is FIFO by store-assigned sequence, not by timestamp, so
//!   items enqueued within the same clock tick keep their order.
//! - Several processes may drain the same queue. An item is applied only by
//!   the drain that claimed it.

use chrono::{DateTime, Utc};

use crate::domain::{Collection, EntityKind, LocalChange, QueueItemId, SyncQueueItem};

/// Outcome of [`ILocalStore::record_mutation`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMutation {
    /// The queue item as stored, with its sequence
    pub item: SyncQueueItem,
    /// Local records written or removed
    pub affected: usize,
}

/// Port trait for the persisted local copies of ERP entities
#[async_trait::async_trait]
pub trait ILocalStore: Send + Sync {
    /// Loads every local record of one kind
    async fn load_collection(&self, kind: EntityKind) -> anyhow::Result<Collection>;

    /// Inserts or replaces records, matched by composite key
    ///
    /// Returns the number of records written.
    async fn upsert_records(&self, records: &Collection) -> anyhow::Result<usize>;

    /// Deletes the record with the given composite key string
    ///
    /// Returns true if a record was removed.
    async fn delete_record(&self, kind: EntityKind, key: &str) -> anyhow::Result<bool>;

    /// Current revision of one kind's collection
    async fn revision(&self, kind: EntityKind) -> anyhow::Result<u64>;

    /// Applies a local change and appends its queue item atomically
    ///
    /// Either both the local records and the queue row are written, or
    /// neither is.
    async fn record_mutation(
        &self,
        change: &LocalChange,
        item: &SyncQueueItem,
    ) -> anyhow::Result<RecordedMutation>;
}

/// Port trait for the sync queue
///
/// ## Implementation Notes
///
/// - `enqueue` assigns a strictly increasing sequence number.
/// - Items rest as `pending`, `failed` or `parked`. A drain moves an item to
///   `in_flight` with `claim` before applying it; the claim expires at its
///   lease deadline, after which `pending` offers the item again.
/// - Committed items are deleted with `remove`.
#[async_trait::async_trait]
pub trait ISyncQueue: Send + Sync {
    /// Appends an item, returning it with its assigned sequence
    async fn enqueue(&self, item: &SyncQueueItem) -> anyhow::Result<SyncQueueItem>;

    /// Replayable items (`pending`, `failed`, expired claims) in FIFO order
    ///
    /// An item whose claim expired is returned in the status it had before
    /// it was claimed.
    async fn pending(&self) -> anyhow::Result<Vec<SyncQueueItem>>;

    /// Claims an item for replay until `lease_until`
    ///
    /// Succeeds only if the stored item is still in the state `item` was read
    /// in (same status and attempt count) or its previous claim expired.
    /// Returns false if another drain claimed, finished or changed it first.
    async fn claim(
        &self,
        item: &SyncQueueItem,
        lease_until: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    /// Every stored item, parked ones included, in FIFO order
    async fn list_all(&self) -> anyhow::Result<Vec<SyncQueueItem>>;

    /// Retrieves one item by id
    async fn get(&self, id: &QueueItemId) -> anyhow::Result<Option<SyncQueueItem>>;

    /// Persists the status, attempt count, error and schedule of an item
    ///
    /// Releases any claim on the item.
    async fn update(&self, item: &SyncQueueItem) -> anyhow::Result<()>;

    /// Removes a committed item; returns true if it was present
    async fn remove(&self, id: &QueueItemId) -> anyhow::Result<bool>;

    /// Number of stored items
    async fn len(&self) -> anyhow::Result<usize>;
}
