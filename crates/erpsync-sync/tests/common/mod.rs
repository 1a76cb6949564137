//! Shared test doubles for the sync crate
//!
//! Hand-written implementations of the port traits that count calls and can
//! be told to fail, plus a harness wiring them to an in-memory database.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Notify;

use erpsync_cache::{DatabasePool, SqliteLocalStore, SqliteSyncQueue};
use erpsync_core::adapters::{RawInvoiceRecord, RawLedgerRecord, RawQuoteRecord, RawStockRecord};
use erpsync_core::domain::{EntityKind, QueueItemId, RetryPolicy, SyncQueueItem};
use erpsync_core::ports::{IRemoteGateway, ISyncQueue};
use erpsync_sync::{RecordingNotificationService, SyncOrchestrator};

// ============================================================================
// MockGateway
// ============================================================================

/// Remote gateway double
///
/// Serves raw records per kind, fails `apply` for payloads whose `code` is
/// in the failing set and counts every call.
#[derive(Default)]
pub struct MockGateway {
    remote: Mutex<HashMap<EntityKind, Vec<Value>>>,
    fetches: Mutex<HashMap<EntityKind, usize>>,
    fail_fetch: AtomicBool,
    /// When set, fetches wait for a notification before answering
    fetch_gate: Mutex<Option<Arc<Notify>>>,
    pub fail_trigger: AtomicBool,
    pub trigger_calls: AtomicUsize,
    pub reachable: AtomicBool,
    failing_codes: Mutex<HashSet<String>>,
    apply_delay: Mutex<Option<Duration>>,
    applied: Mutex<Vec<SyncQueueItem>>,
    pub apply_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remote(&self, kind: EntityKind, records: Vec<Value>) {
        self.remote.lock().unwrap().insert(kind, records);
    }

    pub fn fetch_count(&self, kind: EntityKind) -> usize {
        self.fetches.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn gate_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn ungate_fetches(&self) {
        *self.fetch_gate.lock().unwrap() = None;
    }

    pub fn fail_code(&self, code: &str) {
        self.failing_codes.lock().unwrap().insert(code.to_string());
    }

    pub fn heal_code(&self, code: &str) {
        self.failing_codes.lock().unwrap().remove(code);
    }

    pub fn set_apply_delay(&self, delay: Duration) {
        *self.apply_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Ids of successfully applied items, in apply order
    pub fn applied_ids(&self) -> Vec<QueueItemId> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .map(|item| *item.id())
            .collect()
    }

    /// `code` fields of successfully applied items, in apply order
    pub fn applied_codes(&self) -> Vec<String> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .map(|item| item.payload()["code"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    async fn raw(&self, kind: EntityKind) -> anyhow::Result<Vec<Value>> {
        *self.fetches.lock().unwrap().entry(kind).or_insert(0) += 1;

        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_fetch.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(self
            .remote
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl IRemoteGateway for MockGateway {
    async fn fetch_stock(&self) -> anyhow::Result<Vec<RawStockRecord>> {
        Ok(self.raw(EntityKind::Stock).await?.into_iter().map(Into::into).collect())
    }

    async fn fetch_invoices(&self) -> anyhow::Result<Vec<RawInvoiceRecord>> {
        Ok(self.raw(EntityKind::Invoice).await?.into_iter().map(Into::into).collect())
    }

    async fn fetch_ledger(&self) -> anyhow::Result<Vec<RawLedgerRecord>> {
        Ok(self.raw(EntityKind::Ledger).await?.into_iter().map(Into::into).collect())
    }

    async fn fetch_quotes(&self) -> anyhow::Result<Vec<RawQuoteRecord>> {
        Ok(self.raw(EntityKind::Quote).await?.into_iter().map(Into::into).collect())
    }

    async fn trigger_sync(&self) -> anyhow::Result<()> {
        self.trigger_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_trigger.load(Ordering::SeqCst) {
            anyhow::bail!("HTTP 503 from /sync");
        }
        Ok(())
    }

    async fn apply(&self, item: &SyncQueueItem) -> anyhow::Result<()> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.apply_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let code = item.payload()["code"].as_str().unwrap_or_default().to_string();
        if self.failing_codes.lock().unwrap().contains(&code) {
            anyhow::bail!("remote rejected {code}");
        }
        self.applied.lock().unwrap().push(item.clone());
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

// ============================================================================
// CountingQueue
// ============================================================================

/// SQLite sync queue counting how often it was read for a drain
pub struct CountingQueue {
    inner: SqliteSyncQueue,
    pub pending_calls: AtomicUsize,
}

impl CountingQueue {
    pub fn new(inner: SqliteSyncQueue) -> Self {
        Self {
            inner,
            pending_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ISyncQueue for CountingQueue {
    async fn enqueue(&self, item: &SyncQueueItem) -> anyhow::Result<SyncQueueItem> {
        self.inner.enqueue(item).await
    }

    async fn pending(&self) -> anyhow::Result<Vec<SyncQueueItem>> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.pending().await
    }

    async fn claim(
        &self,
        item: &SyncQueueItem,
        lease_until: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        self.inner.claim(item, lease_until).await
    }

    async fn list_all(&self) -> anyhow::Result<Vec<SyncQueueItem>> {
        self.inner.list_all().await
    }

    async fn get(&self, id: &QueueItemId) -> anyhow::Result<Option<SyncQueueItem>> {
        self.inner.get(id).await
    }

    async fn update(&self, item: &SyncQueueItem) -> anyhow::Result<()> {
        self.inner.update(item).await
    }

    async fn remove(&self, id: &QueueItemId) -> anyhow::Result<bool> {
        self.inner.remove(id).await
    }

    async fn len(&self) -> anyhow::Result<usize> {
        self.inner.len().await
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub pool: DatabasePool,
    pub gateway: Arc<MockGateway>,
    pub queue: Arc<CountingQueue>,
    pub store: Arc<SqliteLocalStore>,
    pub notifier: Arc<RecordingNotificationService>,
    pub orchestrator: Arc<SyncOrchestrator>,
}

pub async fn harness() -> Harness {
    harness_with_policy(RetryPolicy::default()).await
}

pub async fn harness_with_policy(policy: RetryPolicy) -> Harness {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    harness_on(pool, Arc::new(MockGateway::new()), policy)
}

/// Builds an orchestrator over an existing database and gateway
///
/// Two harnesses on one database file behave like two processes sharing
/// the local store and the queue.
pub fn harness_on(pool: DatabasePool, gateway: Arc<MockGateway>, policy: RetryPolicy) -> Harness {
    let queue = Arc::new(CountingQueue::new(SqliteSyncQueue::new(pool.pool().clone())));
    let store = Arc::new(SqliteLocalStore::new(pool.pool().clone()));
    let notifier = Arc::new(RecordingNotificationService::new());

    let orchestrator = Arc::new(SyncOrchestrator::new(
        gateway.clone(),
        store.clone(),
        queue.clone(),
        notifier.clone(),
        policy,
    ));

    Harness {
        pool,
        gateway,
        queue,
        store,
        notifier,
        orchestrator,
    }
}

/// A stock mutation payload identified by `code`
pub fn stock_payload(code: &str, quantity: f64) -> Value {
    serde_json::json!({
        "code": code,
        "warehouse": "MERKEZ",
        "name": format!("Item {code}"),
        "quantity": quantity,
    })
}
