//! Sync orchestrator
//!
//! Entry points used by the front ends:
//!
//! - [`SyncOrchestrator::refresh_all`] - mark every cached collection stale
//! - [`SyncOrchestrator::sync_now`] - trigger the remote sync, then refresh
//! - [`SyncOrchestrator::process_sync_queue`] - fire-and-forget queue drain
//! - [`SyncOrchestrator::attempt_queue_drain`] - awaited queue drain
//! - [`SyncOrchestrator::enqueue`] - record a local mutation for replay
//! - [`SyncOrchestrator::collections`] - the four canonical collections

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use erpsync_core::adapters::adapt_value;
use erpsync_core::domain::{
    display_key, EntityKind, ErpCollections, LocalChange, QueueOperation, RetryPolicy,
    SyncQueueItem,
};
use erpsync_core::ports::{
    ILocalStore, INotificationService, IRemoteGateway, ISyncQueue, Notification,
};

use crate::cache::QueryCache;
use crate::notify::deliver;
use crate::replay::{DrainMode, DrainOutcome, QueueReplayer};
use crate::SyncError;

/// Coordinates the remote gateway, the query cache, the local store and the
/// sync queue
pub struct SyncOrchestrator {
    gateway: Arc<dyn IRemoteGateway>,
    store: Arc<dyn ILocalStore>,
    queue: Arc<dyn ISyncQueue>,
    notifier: Arc<dyn INotificationService>,
    cache: Arc<QueryCache>,
    replayer: Arc<QueueReplayer>,
}

impl SyncOrchestrator {
    /// `store` records queued mutations into the queue `queue` drains, so
    /// both must be backed by the same database.
    pub fn new(
        gateway: Arc<dyn IRemoteGateway>,
        store: Arc<dyn ILocalStore>,
        queue: Arc<dyn ISyncQueue>,
        notifier: Arc<dyn INotificationService>,
        policy: RetryPolicy,
    ) -> Self {
        let cache = Arc::new(QueryCache::new(Arc::clone(&gateway)));
        let replayer = Arc::new(QueueReplayer::new(
            Arc::clone(&queue),
            Arc::clone(&gateway),
            Arc::clone(&notifier),
            policy,
        ));

        Self {
            gateway,
            store,
            queue,
            notifier,
            cache,
            replayer,
        }
    }

    /// The query cache, shared with reconciliation and the front ends
    pub fn cache(&self) -> Arc<QueryCache> {
        Arc::clone(&self.cache)
    }

    pub fn replayer(&self) -> Arc<QueueReplayer> {
        Arc::clone(&self.replayer)
    }

    /// Marks every cached remote collection stale
    ///
    /// Returns once the invalidation is in place; collections are re-fetched
    /// by the next read of each kind.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_all(&self) {
        self.cache.invalidate_all().await;
        info!("Remote collections invalidated");
    }

    /// Triggers the remote-side sync and refreshes the cache when it completes
    ///
    /// On failure the cache is left untouched and one error notification is
    /// raised.
    #[tracing::instrument(skip(self))]
    pub async fn sync_now(&self) -> Result<(), SyncError> {
        info!("Triggering remote sync");

        if let Err(e) = self.gateway.trigger_sync().await {
            error!(error = %e, "Remote sync failed");
            deliver(
                self.notifier.as_ref(),
                Notification::error("Sync failed", format!("{e:#}")),
            )
            .await;
            return Err(SyncError::Gateway {
                operation: "sync trigger",
                source: e,
            });
        }

        self.refresh_all().await;
        deliver(
            self.notifier.as_ref(),
            Notification::sync("Sync complete", "Remote data refreshed"),
        )
        .await;
        Ok(())
    }

    /// Starts an automatic queue drain in the background and returns at once
    ///
    /// The drain outcome is only logged. The handle may be awaited or
    /// dropped.
    pub fn process_sync_queue(&self) -> JoinHandle<()> {
        let replayer = Arc::clone(&self.replayer);
        tokio::spawn(async move {
            match replayer.drain(DrainMode::Automatic).await {
                Ok(DrainOutcome::AlreadyRunning) => {}
                Ok(DrainOutcome::Completed(report)) if report.attempted > 0 => {
                    info!(
                        committed = report.committed,
                        failed = report.failed,
                        parked = report.parked,
                        "Background queue drain finished"
                    );
                }
                Ok(DrainOutcome::Completed(_)) => {}
                Err(e) => warn!(error = %e, "Background queue drain failed"),
            }
        })
    }

    /// Runs a queue drain and waits for it
    #[tracing::instrument(skip(self))]
    pub async fn attempt_queue_drain(&self, mode: DrainMode) -> Result<DrainOutcome, SyncError> {
        self.replayer.drain(mode).await
    }

    /// Applies a mutation to the local store and queues it for the remote
    ///
    /// The payload is normalized like a remote record to find its composite
    /// key. Creates and updates upsert the normalized record; deletes remove
    /// the record with that key. The original payload is what gets replayed.
    /// The local write and the queue entry are stored atomically.
    ///
    /// # Errors
    ///
    /// `SyncError::InvalidPayload` if the payload is not a JSON object;
    /// `SyncError::Store` if the write fails, in which case neither the
    /// local store nor the queue changed.
    #[tracing::instrument(skip(self, payload))]
    pub async fn enqueue(
        &self,
        entity: EntityKind,
        operation: QueueOperation,
        payload: Value,
    ) -> Result<SyncQueueItem, SyncError> {
        if !payload.is_object() {
            return Err(SyncError::InvalidPayload(format!(
                "{} {} payload must be a JSON object",
                operation, entity
            )));
        }

        let normalized = adapt_value(entity, &payload, Utc::now());
        let change = match operation {
            QueueOperation::Create | QueueOperation::Update => LocalChange::Upsert(normalized),
            QueueOperation::Delete => LocalChange::deleting(&normalized)
                .map_err(|e| SyncError::InvalidPayload(e.to_string()))?,
        };

        let recorded = self
            .store
            .record_mutation(&change, &SyncQueueItem::new(entity, operation, payload))
            .await
            .map_err(SyncError::store("enqueue"))?;

        if let LocalChange::Delete { keys, .. } = &change {
            if recorded.affected < keys.len() {
                let keys: Vec<String> = keys.iter().map(|key| display_key(key)).collect();
                warn!(
                    %entity,
                    keys = ?keys,
                    "Delete queued for a record not in the local store"
                );
            }
        }

        let item = recorded.item;
        info!(
            id = %item.id(),
            %entity,
            %operation,
            sequence = item.sequence(),
            "Mutation queued for replay"
        );
        Ok(item)
    }

    /// The four canonical remote collections, fetching any that are stale
    #[tracing::instrument(skip(self))]
    pub async fn collections(&self) -> Result<ErpCollections, SyncError> {
        let mut collections = ErpCollections::default();
        for kind in EntityKind::ALL {
            let versioned = self.cache.get(kind).await?;
            collections.insert(versioned.collection.as_ref().clone());
        }
        Ok(collections)
    }

    /// Moves parked queue items back to pending
    pub async fn requeue_parked(&self) -> Result<usize, SyncError> {
        self.replayer.requeue_parked().await
    }

    /// Every stored queue item, in FIFO order
    pub async fn queue_items(&self) -> Result<Vec<SyncQueueItem>, SyncError> {
        self.queue
            .list_all()
            .await
            .map_err(SyncError::store("queue read"))
    }
}
