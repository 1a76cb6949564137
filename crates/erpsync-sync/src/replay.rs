//! Sync queue replay
//!
//! A drain walks the replayable items (`pending` and `failed`) in FIFO order
//! and applies each one on the remote side. Items are independent: a failure
//! is recorded on the item and the drain moves on to the next one.
//!
//! ```text
//! pending ──► in_flight ──► committed (removed from the queue)
//!    ▲            │
//!    │            ├──► failed ──► in_flight ... (after backoff)
//!    │            └──► parked (attempt cap reached)
//!    └── requeue ─────────┘
//! ```
//!
//! Only one drain runs at a time in a process. A drain requested while
//! another is active returns [`DrainOutcome::AlreadyRunning`] without
//! touching the queue. Drains in other processes sharing the queue are kept
//! apart per item: each item is claimed in the store before it is applied,
//! and an item some other drain claimed or removed first is left alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use erpsync_core::domain::{QueueItemStatus, RetryPolicy, SyncQueueItem};
use erpsync_core::ports::{
    INotificationService, IRemoteGateway, ISyncQueue, Notification, NotificationPriority,
};

use crate::notify::deliver;
use crate::SyncError;

/// How long a claim protects an item from other drains
const CLAIM_LEASE_SECS: i64 = 300;

/// Whether a drain honours the retry backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// User-requested: replays every replayable item now
    Manual,
    /// Connectivity or startup triggered: skips items not yet due
    Automatic,
}

/// Counts of one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub attempted: usize,
    pub committed: usize,
    pub failed: usize,
    pub parked: usize,
    /// Items left alone because their backoff had not elapsed
    pub skipped: usize,
    /// Items another drain claimed or committed first
    pub contended: usize,
}

/// Result of a drain request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed(DrainReport),
    AlreadyRunning,
}

impl DrainOutcome {
    pub fn report(&self) -> Option<&DrainReport> {
        match self {
            DrainOutcome::Completed(report) => Some(report),
            DrainOutcome::AlreadyRunning => None,
        }
    }
}

/// Holds the in-flight flag; releases it on every exit path
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Replays queued mutations against the remote gateway
pub struct QueueReplayer {
    queue: Arc<dyn ISyncQueue>,
    gateway: Arc<dyn IRemoteGateway>,
    notifier: Arc<dyn INotificationService>,
    policy: RetryPolicy,
    draining: AtomicBool,
}

impl QueueReplayer {
    pub fn new(
        queue: Arc<dyn ISyncQueue>,
        gateway: Arc<dyn IRemoteGateway>,
        notifier: Arc<dyn INotificationService>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            queue,
            gateway,
            notifier,
            policy,
            draining: AtomicBool::new(false),
        }
    }

    /// Returns true while a drain is in progress
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs one drain pass unless another one is active
    ///
    /// # Errors
    ///
    /// `SyncError::Store` if the queue cannot be read or an item's new
    /// state cannot be persisted. Remote failures are not errors; they are
    /// recorded on the item and counted in the report.
    pub async fn drain(&self, mode: DrainMode) -> Result<DrainOutcome, SyncError> {
        let Some(_guard) = DrainGuard::try_acquire(&self.draining) else {
            debug!(?mode, "Queue drain already running, request ignored");
            return Ok(DrainOutcome::AlreadyRunning);
        };

        let items = self
            .queue
            .pending()
            .await
            .map_err(SyncError::store("queue read"))?;
        if items.is_empty() {
            debug!("Sync queue empty, nothing to replay");
            return Ok(DrainOutcome::Completed(DrainReport::default()));
        }

        info!(?mode, items = items.len(), "Draining sync queue");
        let mut report = DrainReport::default();
        for item in items {
            if mode == DrainMode::Automatic && !item.is_due(Utc::now()) {
                report.skipped += 1;
                continue;
            }

            let lease_until = Utc::now() + Duration::seconds(CLAIM_LEASE_SECS);
            let claimed = self
                .queue
                .claim(&item, lease_until)
                .await
                .map_err(SyncError::store("queue claim"))?;
            if !claimed {
                debug!(id = %item.id(), "Queue item claimed by another drain, skipped");
                report.contended += 1;
                continue;
            }

            report.attempted += 1;
            match self.replay_item(item).await? {
                Some(QueueItemStatus::Committed) => report.committed += 1,
                Some(QueueItemStatus::Parked) => report.parked += 1,
                Some(_) => report.failed += 1,
                None => report.contended += 1,
            }
        }

        info!(
            attempted = report.attempted,
            committed = report.committed,
            failed = report.failed,
            parked = report.parked,
            skipped = report.skipped,
            contended = report.contended,
            "Sync queue drain finished"
        );
        Ok(DrainOutcome::Completed(report))
    }

    /// Applies one claimed item and persists the outcome
    ///
    /// Returns the item's final status, or `None` if the item was gone from
    /// the queue by the time the remote confirmed it.
    async fn replay_item(
        &self,
        mut item: SyncQueueItem,
    ) -> Result<Option<QueueItemStatus>, SyncError> {
        item.begin_replay()?;

        match self.gateway.apply(&item).await {
            Ok(()) => {
                item.mark_committed()?;
                let removed = self
                    .queue
                    .remove(item.id())
                    .await
                    .map_err(SyncError::store("queue remove"))?;
                if !removed {
                    warn!(
                        id = %item.id(),
                        entity = %item.entity(),
                        "Queue item vanished while being applied"
                    );
                    return Ok(None);
                }
                debug!(id = %item.id(), entity = %item.entity(), "Queue item committed");
                Ok(Some(QueueItemStatus::Committed))
            }
            Err(e) => {
                let status = item.record_failure(format!("{e:#}"), &self.policy, Utc::now())?;
                self.queue
                    .update(&item)
                    .await
                    .map_err(SyncError::store("queue update"))?;

                if status == QueueItemStatus::Parked {
                    warn!(
                        id = %item.id(),
                        entity = %item.entity(),
                        attempts = item.attempts(),
                        error = %e,
                        "Queue item parked after repeated failures"
                    );
                    deliver(
                        self.notifier.as_ref(),
                        Notification::queue(
                            "Queued change parked",
                            format!(
                                "{} {} failed {} times: {}. Run 'erpsync queue requeue' to retry.",
                                item.operation(),
                                item.entity(),
                                item.attempts(),
                                e
                            ),
                        )
                        .with_priority(NotificationPriority::High),
                    )
                    .await;
                } else {
                    debug!(
                        id = %item.id(),
                        attempts = item.attempts(),
                        next_attempt_at = ?item.next_attempt_at(),
                        error = %e,
                        "Queue item replay failed"
                    );
                }
                Ok(Some(status))
            }
        }
    }

    /// Moves every parked item back to pending; returns how many moved
    pub async fn requeue_parked(&self) -> Result<usize, SyncError> {
        let items = self
            .queue
            .list_all()
            .await
            .map_err(SyncError::store("queue read"))?;

        let mut moved = 0;
        for mut item in items.into_iter().filter(SyncQueueItem::is_parked) {
            item.requeue()?;
            self.queue
                .update(&item)
                .await
                .map_err(SyncError::store("queue update"))?;
            moved += 1;
        }

        if moved > 0 {
            info!(count = moved, "Parked queue items requeued");
        }
        Ok(moved)
    }
}
