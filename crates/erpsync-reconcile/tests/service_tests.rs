//! Reconciliation service tests against in-memory collection sources

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use erpsync_core::domain::{Collection, Currency, EntityKind, StockItem};
use erpsync_core::ports::{ICollectionSource, VersionedCollection};
use erpsync_reconcile::{ReconcileError, ReconciliationService};
use tokio::sync::Mutex;

/// Collection source whose revision bumps on every `set`
#[derive(Default)]
struct MemorySource {
    collections: Mutex<HashMap<EntityKind, (u64, Collection)>>,
    fail: Mutex<bool>,
}

impl MemorySource {
    async fn set(&self, collection: Collection) {
        let mut collections = self.collections.lock().await;
        let kind = collection.kind();
        let revision = collections.get(&kind).map_or(1, |(rev, _)| rev + 1);
        collections.insert(kind, (revision, collection));
    }
}

#[async_trait::async_trait]
impl ICollectionSource for MemorySource {
    async fn snapshot(&self, kind: EntityKind) -> anyhow::Result<VersionedCollection> {
        if *self.fail.lock().await {
            anyhow::bail!("source offline");
        }
        let collections = self.collections.lock().await;
        Ok(match collections.get(&kind) {
            Some((revision, collection)) => VersionedCollection::new(*revision, collection.clone()),
            None => VersionedCollection::new(0, Collection::empty(kind)),
        })
    }
}

fn stock(code: &str, quantity: f64) -> StockItem {
    StockItem {
        code: code.to_string(),
        warehouse: "MERKEZ".to_string(),
        name: "Carbide drill".to_string(),
        quantity: Some(quantity),
        unit: "ADET".to_string(),
        unit_price: Some(10.0),
        currency: Currency::Try,
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
    }
}

fn setup() -> (Arc<MemorySource>, Arc<MemorySource>, ReconciliationService) {
    let local = Arc::new(MemorySource::default());
    let remote = Arc::new(MemorySource::default());
    let service = ReconciliationService::new(local.clone(), remote.clone());
    (local, remote, service)
}

#[tokio::test]
async fn snapshot_covers_all_kinds() {
    let (local, remote, service) = setup();
    local.set(Collection::Stock(vec![stock("SKU001", 150.0)])).await;
    remote.set(Collection::Stock(vec![stock("SKU001", 140.0)])).await;

    let snapshot = service.snapshot().await.unwrap();

    let stock_diff = snapshot.stock().unwrap();
    assert_eq!(stock_diff.conflicts.len(), 1);
    assert_eq!(stock_diff.conflicts[0].left.quantity, Some(150.0));
    assert_eq!(stock_diff.conflicts[0].right.quantity, Some(140.0));
    assert!(snapshot.ledger().unwrap().is_reconciled());
    assert!(snapshot.invoices().unwrap().is_reconciled());
    assert!(snapshot.quotes().unwrap().is_reconciled());
    assert_eq!(snapshot.iter().count(), 4);
    assert!(!snapshot.is_reconciled());
}

#[tokio::test]
async fn unchanged_sides_reuse_previous_diff() {
    let (local, _remote, service) = setup();
    local.set(Collection::Stock(vec![stock("SKU001", 1.0)])).await;

    let first = service.diff_for(EntityKind::Stock).await.unwrap();
    let second = service.diff_for(EntityKind::Stock).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        service.recompute_counts().await.get(&EntityKind::Stock),
        Some(&1)
    );
}

#[tokio::test]
async fn only_changed_kind_is_recomputed() {
    let (local, remote, service) = setup();
    service.snapshot().await.unwrap();

    remote.set(Collection::Stock(vec![stock("SKU009", 3.0)])).await;
    service.snapshot().await.unwrap();

    let counts = service.recompute_counts().await;
    assert_eq!(counts.get(&EntityKind::Stock), Some(&2));
    assert_eq!(counts.get(&EntityKind::Ledger), Some(&1));
    assert_eq!(counts.get(&EntityKind::Invoice), Some(&1));
    assert_eq!(counts.get(&EntityKind::Quote), Some(&1));

    local.set(Collection::Stock(vec![stock("SKU009", 3.0)])).await;
    let diff = service.diff_for(EntityKind::Stock).await.unwrap();
    assert!(diff.is_reconciled());
    assert_eq!(
        service.recompute_counts().await.get(&EntityKind::Stock),
        Some(&3)
    );
}

#[tokio::test]
async fn source_failure_is_reported_with_side() {
    let (_local, remote, service) = setup();
    *remote.fail.lock().await = true;

    let err = service.diff_for(EntityKind::Quote).await.unwrap_err();
    match err {
        ReconcileError::Source { side, kind, .. } => {
            assert_eq!(side, "remote");
            assert_eq!(kind, "quote");
        }
        other => panic!("unexpected error: {other}"),
    }
}
