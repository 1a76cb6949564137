//! Query cache of remote collections
//!
//! Holds the last normalized collection fetched for each entity kind. An
//! entry is *fresh* while no invalidation of its kind happened after the
//! fetch that produced it started. Reading a kind without a fresh entry
//! fetches it through the gateway and the record adapters.
//!
//! Every stored fetch gets a new generation number, which is the revision
//! the reconciliation service sees on the remote side.
//!
//! ## Invalidation
//!
//! ```text
//! get(kind) ── epoch 3 ──► fetch ...................► store (epoch 3)
//!                  invalidate_all() ── epoch 4 ──┘      └─ stale: 3 != 4
//! ```
//!
//! A fetch that was already in flight when the cache was invalidated is still
//! returned to its caller and stored as a stale entry, unless a fetch started
//! after the invalidation has stored its entry first. A late fetch never
//! replaces a newer one.
//!
//! ## Refresh signal
//!
//! `is_refreshing()` turns true with an invalidation and stays true until
//! every invalidated kind holds a fresh entry again (and while any fetch
//! runs), so `invalidate_all()` raises it for all four kinds at once.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use erpsync_core::domain::{Collection, EntityKind};
use erpsync_core::ports::{ICollectionSource, IRemoteGateway, VersionedCollection};

use crate::SyncError;

#[derive(Debug, Clone)]
struct CacheEntry {
    generation: u64,
    /// Invalidation epoch at the time the fetch started
    epoch: u64,
    collection: Arc<Collection>,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<EntityKind, CacheEntry>,
    epochs: HashMap<EntityKind, u64>,
    /// Invalidated kinds without a fresh entry yet
    awaiting: HashSet<EntityKind>,
    last_generation: u64,
}

impl CacheState {
    fn epoch(&self, kind: EntityKind) -> u64 {
        self.epochs.get(&kind).copied().unwrap_or(0)
    }

    fn fresh_entry(&self, kind: EntityKind) -> Option<&CacheEntry> {
        self.entries
            .get(&kind)
            .filter(|entry| entry.epoch == self.epoch(kind))
    }
}

/// Counts in-flight fetches for the lifetime of the guard
struct RefreshGuard<'a>(&'a AtomicUsize);

impl<'a> RefreshGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Per-entity cache of remote collections
pub struct QueryCache {
    gateway: Arc<dyn IRemoteGateway>,
    state: RwLock<CacheState>,
    refreshing: AtomicUsize,
    /// Mirrors `CacheState::awaiting.len()` for the lock-free refresh signal
    awaiting: AtomicUsize,
}

impl QueryCache {
    pub fn new(gateway: Arc<dyn IRemoteGateway>) -> Self {
        Self {
            gateway,
            state: RwLock::new(CacheState::default()),
            refreshing: AtomicUsize::new(0),
            awaiting: AtomicUsize::new(0),
        }
    }

    /// Returns the cached collection for `kind`, fetching it if not fresh
    ///
    /// # Errors
    ///
    /// `SyncError::Gateway` if the fetch fails. The previous entry, if any,
    /// is left as it was.
    pub async fn get(&self, kind: EntityKind) -> Result<VersionedCollection, SyncError> {
        let epoch = {
            let state = self.state.read().await;
            if let Some(entry) = state.fresh_entry(kind) {
                return Ok(VersionedCollection {
                    revision: entry.generation,
                    collection: Arc::clone(&entry.collection),
                });
            }
            state.epoch(kind)
        };

        let collection = {
            let _guard = RefreshGuard::enter(&self.refreshing);
            debug!(%kind, "Fetching remote collection");
            self.gateway
                .fetch_collection(kind)
                .await
                .map_err(SyncError::gateway("fetch"))?
        };

        let mut state = self.state.write().await;
        state.last_generation += 1;
        let entry = CacheEntry {
            generation: state.last_generation,
            epoch,
            collection: Arc::new(collection),
            fetched_at: Utc::now(),
        };
        let fresh = entry.epoch == state.epoch(kind);
        let result = VersionedCollection {
            revision: entry.generation,
            collection: Arc::clone(&entry.collection),
        };

        let superseded = state
            .entries
            .get(&kind)
            .map_or(false, |current| current.epoch > entry.epoch);
        if superseded {
            debug!(
                %kind,
                generation = entry.generation,
                "Late fetch not cached, a newer entry is already stored"
            );
        } else {
            info!(
                %kind,
                records = entry.collection.len(),
                generation = entry.generation,
                fresh,
                "Remote collection cached"
            );
            state.entries.insert(kind, entry);
        }

        if fresh {
            state.awaiting.remove(&kind);
            self.awaiting.store(state.awaiting.len(), Ordering::Release);
        }
        Ok(result)
    }

    /// Marks one kind stale; the next `get` re-fetches it
    pub async fn invalidate(&self, kind: EntityKind) {
        let mut state = self.state.write().await;
        *state.epochs.entry(kind).or_insert(0) += 1;
        state.awaiting.insert(kind);
        self.awaiting.store(state.awaiting.len(), Ordering::Release);
        debug!(%kind, "Cache entry invalidated");
    }

    /// Marks every kind stale in one step
    pub async fn invalidate_all(&self) {
        let mut state = self.state.write().await;
        for kind in EntityKind::ALL {
            *state.epochs.entry(kind).or_insert(0) += 1;
            state.awaiting.insert(kind);
        }
        self.awaiting.store(state.awaiting.len(), Ordering::Release);
        debug!("All cache entries invalidated");
    }

    /// Returns true if `kind` has an entry no invalidation has overtaken
    pub async fn is_fresh(&self, kind: EntityKind) -> bool {
        self.state.read().await.fresh_entry(kind).is_some()
    }

    /// When the entry for `kind` was fetched, fresh or not
    pub async fn fetched_at(&self, kind: EntityKind) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .await
            .entries
            .get(&kind)
            .map(|entry| entry.fetched_at)
    }

    /// Returns true from an invalidation until every invalidated kind has
    /// been fetched again, and while any fetch is in flight
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire) > 0 || self.awaiting.load(Ordering::Acquire) > 0
    }
}

#[async_trait::async_trait]
impl ICollectionSource for QueryCache {
    async fn snapshot(&self, kind: EntityKind) -> anyhow::Result<VersionedCollection> {
        Ok(self.get(kind).await?)
    }
}
