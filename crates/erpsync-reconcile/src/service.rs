//! Reconciliation service
//!
//! Runs the diff engine once per entity kind, with that kind's composite
//! key, over a local and a remote [`ICollectionSource`]. The revisions each
//! diff was computed from are remembered, and a kind is only recomputed when
//! its local or remote revision moved.
//!
//! The service is read-only: it never writes to either side.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use erpsync_core::domain::{EntityKind, Invoice, LedgerEntry, Quote, StockItem};
use erpsync_core::ports::ICollectionSource;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::diff::DiffResult;
use crate::entity_diff::EntityDiff;
use crate::error::ReconcileError;

struct CachedDiff {
    local_revision: u64,
    remote_revision: u64,
    diff: Arc<EntityDiff>,
}

#[derive(Default)]
struct ServiceState {
    cached: HashMap<EntityKind, CachedDiff>,
    recomputes: BTreeMap<EntityKind, u64>,
}

/// Computes and caches per-kind reconciliation diffs
pub struct ReconciliationService {
    local: Arc<dyn ICollectionSource>,
    remote: Arc<dyn ICollectionSource>,
    state: Mutex<ServiceState>,
}

impl ReconciliationService {
    pub fn new(local: Arc<dyn ICollectionSource>, remote: Arc<dyn ICollectionSource>) -> Self {
        Self {
            local,
            remote,
            state: Mutex::new(ServiceState::default()),
        }
    }

    /// Returns the diff for one kind, recomputing it only if either side
    /// changed since the last call
    pub async fn diff_for(&self, kind: EntityKind) -> Result<Arc<EntityDiff>, ReconcileError> {
        let local = self
            .local
            .snapshot(kind)
            .await
            .map_err(|source| ReconcileError::Source {
                side: "local",
                kind: kind.to_string(),
                source,
            })?;
        let remote = self
            .remote
            .snapshot(kind)
            .await
            .map_err(|source| ReconcileError::Source {
                side: "remote",
                kind: kind.to_string(),
                source,
            })?;

        let mut state = self.state.lock().await;
        if let Some(cached) = state.cached.get(&kind) {
            if cached.local_revision == local.revision && cached.remote_revision == remote.revision
            {
                debug!(%kind, "Reusing reconciliation diff, both sides unchanged");
                return Ok(Arc::clone(&cached.diff));
            }
        }

        let diff = Arc::new(EntityDiff::compute(&local.collection, &remote.collection)?);
        let summary = diff.summary();
        info!(
            %kind,
            local_revision = local.revision,
            remote_revision = remote.revision,
            only_local = summary.only_local,
            only_remote = summary.only_remote,
            conflicts = summary.conflicts,
            "Reconciliation diff recomputed"
        );

        state.cached.insert(
            kind,
            CachedDiff {
                local_revision: local.revision,
                remote_revision: remote.revision,
                diff: Arc::clone(&diff),
            },
        );
        *state.recomputes.entry(kind).or_insert(0) += 1;

        Ok(diff)
    }

    /// Diffs for all four entity kinds
    pub async fn snapshot(&self) -> Result<ReconciliationSnapshot, ReconcileError> {
        let mut diffs = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            diffs.push(self.diff_for(kind).await?);
        }
        Ok(ReconciliationSnapshot { diffs })
    }

    /// How many times each kind's diff was actually computed
    pub async fn recompute_counts(&self) -> BTreeMap<EntityKind, u64> {
        self.state.lock().await.recomputes.clone()
    }
}

/// Read-only view of the four per-kind diffs
#[derive(Debug, Clone)]
pub struct ReconciliationSnapshot {
    diffs: Vec<Arc<EntityDiff>>,
}

impl ReconciliationSnapshot {
    pub fn get(&self, kind: EntityKind) -> Option<&EntityDiff> {
        self.diffs
            .iter()
            .map(|diff| &**diff)
            .find(|diff| diff.kind() == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityDiff> {
        self.diffs.iter().map(|diff| &**diff)
    }

    pub fn stock(&self) -> Option<&DiffResult<StockItem>> {
        match self.get(EntityKind::Stock)? {
            EntityDiff::Stock(diff) => Some(diff),
            _ => None,
        }
    }

    pub fn ledger(&self) -> Option<&DiffResult<LedgerEntry>> {
        match self.get(EntityKind::Ledger)? {
            EntityDiff::Ledger(diff) => Some(diff),
            _ => None,
        }
    }

    pub fn invoices(&self) -> Option<&DiffResult<Invoice>> {
        match self.get(EntityKind::Invoice)? {
            EntityDiff::Invoice(diff) => Some(diff),
            _ => None,
        }
    }

    pub fn quotes(&self) -> Option<&DiffResult<Quote>> {
        match self.get(EntityKind::Quote)? {
            EntityDiff::Quote(diff) => Some(diff),
            _ => None,
        }
    }

    /// Returns true if every kind is reconciled
    pub fn is_reconciled(&self) -> bool {
        self.iter().all(EntityDiff::is_reconciled)
    }
}
