//! Integration tests for SqliteLocalStore
//!
//! Each test opens a fresh in-memory database.

use chrono::{TimeZone, Utc};

use serde_json::json;

use erpsync_cache::{DatabasePool, SqliteLocalStore, SqliteSyncQueue};
use erpsync_core::domain::{
    Collection, Currency, EntityKind, ErpRecord, LocalChange, QueueOperation, Quote, StockItem,
    SyncQueueItem,
};
use erpsync_core::ports::{ICollectionSource, ILocalStore, ISyncQueue};

// ============================================================================
// Test helpers
// ============================================================================

async fn setup() -> SqliteLocalStore {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    SqliteLocalStore::new(pool.pool().clone())
}

async fn setup_with_queue() -> (SqliteLocalStore, SqliteSyncQueue) {
    let pool = DatabasePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    (
        SqliteLocalStore::new(pool.pool().clone()),
        SqliteSyncQueue::new(pool.pool().clone()),
    )
}

fn stock_update(code: &str) -> SyncQueueItem {
    SyncQueueItem::new(
        EntityKind::Stock,
        QueueOperation::Update,
        json!({"code": code, "warehouse": "MERKEZ"}),
    )
}

fn stock(code: &str, warehouse: &str, quantity: f64) -> StockItem {
    StockItem {
        code: code.to_string(),
        warehouse: warehouse.to_string(),
        name: format!("Item {code}"),
        quantity: Some(quantity),
        unit: "ADET".to_string(),
        unit_price: Some(12.5),
        currency: Currency::Try,
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
    }
}

fn quote(number: &str) -> Quote {
    Quote {
        quote_number: number.to_string(),
        date: Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap(),
        customer_code: "C001".to_string(),
        customer_name: "Acme".to_string(),
        total: Some(1000.0),
        currency: Currency::Eur,
        status: "draft".to_string(),
        valid_until: None,
    }
}

// ============================================================================
// Records
// ============================================================================

#[tokio::test]
async fn test_empty_store_loads_empty_collections() {
    let store = setup().await;
    for kind in EntityKind::ALL {
        let collection = store.load_collection(kind).await.unwrap();
        assert_eq!(collection.kind(), kind);
        assert!(collection.is_empty());
        assert_eq!(store.revision(kind).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_upsert_and_load_roundtrip() {
    let store = setup().await;
    let records = vec![stock("SKU002", "MERKEZ", 5.0), stock("SKU001", "MERKEZ", 150.0)];

    let written = store
        .upsert_records(&Collection::Stock(records))
        .await
        .unwrap();
    assert_eq!(written, 2);

    let loaded = store.load_collection(EntityKind::Stock).await.unwrap();
    match loaded {
        Collection::Stock(items) => {
            // Ordered by composite key
            assert_eq!(items[0], stock("SKU001", "MERKEZ", 150.0));
            assert_eq!(items[1], stock("SKU002", "MERKEZ", 5.0));
        }
        other => panic!("unexpected collection: {other:?}"),
    }
}

#[tokio::test]
async fn test_upsert_replaces_by_composite_key() {
    let store = setup().await;
    store
        .upsert_records(&Collection::Stock(vec![stock("SKU001", "MERKEZ", 150.0)]))
        .await
        .unwrap();
    store
        .upsert_records(&Collection::Stock(vec![
            stock("SKU001", "MERKEZ", 140.0),
            stock("SKU001", "DEPO2", 3.0),
        ]))
        .await
        .unwrap();

    let loaded = store.load_collection(EntityKind::Stock).await.unwrap();
    assert_eq!(loaded.len(), 2);
    let Collection::Stock(items) = loaded else {
        panic!("expected stock");
    };
    let merkez = items.iter().find(|i| i.warehouse == "MERKEZ").unwrap();
    assert_eq!(merkez.quantity, Some(140.0));
}

#[tokio::test]
async fn test_kinds_are_isolated() {
    let store = setup().await;
    store
        .upsert_records(&Collection::Quote(vec![quote("Q-1")]))
        .await
        .unwrap();

    assert!(store
        .load_collection(EntityKind::Stock)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store.load_collection(EntityKind::Quote).await.unwrap().len(),
        1
    );
    assert_eq!(store.revision(EntityKind::Stock).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_by_key() {
    let store = setup().await;
    let item = stock("SKU001", "MERKEZ", 1.0);
    store
        .upsert_records(&Collection::Stock(vec![item.clone()]))
        .await
        .unwrap();

    assert!(store
        .delete_record(EntityKind::Stock, &item.composite_key())
        .await
        .unwrap());
    assert!(!store
        .delete_record(EntityKind::Stock, &item.composite_key())
        .await
        .unwrap());
    assert!(store
        .load_collection(EntityKind::Stock)
        .await
        .unwrap()
        .is_empty());
}

// ============================================================================
// Revisions
// ============================================================================

#[tokio::test]
async fn test_revision_bumps_on_every_write() {
    let store = setup().await;
    let item = stock("SKU001", "MERKEZ", 1.0);

    store
        .upsert_records(&Collection::Stock(vec![item.clone()]))
        .await
        .unwrap();
    assert_eq!(store.revision(EntityKind::Stock).await.unwrap(), 1);

    store
        .upsert_records(&Collection::Stock(vec![item.clone()]))
        .await
        .unwrap();
    assert_eq!(store.revision(EntityKind::Stock).await.unwrap(), 2);

    store
        .delete_record(EntityKind::Stock, &item.composite_key())
        .await
        .unwrap();
    assert_eq!(store.revision(EntityKind::Stock).await.unwrap(), 3);
}

#[tokio::test]
async fn test_noop_writes_keep_revision() {
    let store = setup().await;
    store
        .upsert_records(&Collection::Stock(Vec::new()))
        .await
        .unwrap();
    store
        .delete_record(EntityKind::Stock, "missing")
        .await
        .unwrap();
    assert_eq!(store.revision(EntityKind::Stock).await.unwrap(), 0);
}

#[tokio::test]
async fn test_snapshot_carries_revision() {
    let store = setup().await;
    store
        .upsert_records(&Collection::Quote(vec![quote("Q-1"), quote("Q-2")]))
        .await
        .unwrap();

    let snapshot = store.snapshot(EntityKind::Quote).await.unwrap();
    assert_eq!(snapshot.revision, 1);
    assert_eq!(snapshot.collection.len(), 2);
}

// ============================================================================
// Queued mutations
// ============================================================================

#[tokio::test]
async fn test_record_mutation_writes_record_and_queue_row() {
    let (store, queue) = setup_with_queue().await;
    let change = LocalChange::Upsert(Collection::Stock(vec![stock("SKU001", "MERKEZ", 4.0)]));

    let recorded = store
        .record_mutation(&change, &stock_update("SKU001"))
        .await
        .unwrap();

    assert_eq!(recorded.affected, 1);
    assert!(recorded.item.sequence() > 0);
    assert_eq!(store.load_collection(EntityKind::Stock).await.unwrap().len(), 1);
    assert_eq!(store.revision(EntityKind::Stock).await.unwrap(), 1);

    let pending = queue.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id(), recorded.item.id());
}

#[tokio::test]
async fn test_record_mutation_rolls_back_local_write_when_enqueue_fails() {
    let (store, queue) = setup_with_queue().await;
    let item = stock_update("SKU001");
    store
        .record_mutation(
            &LocalChange::Upsert(Collection::Stock(vec![stock("SKU001", "MERKEZ", 4.0)])),
            &item,
        )
        .await
        .unwrap();

    // Same queue id again: the insert violates the unique constraint
    let result = store
        .record_mutation(
            &LocalChange::Upsert(Collection::Stock(vec![stock("SKU002", "MERKEZ", 9.0)])),
            &item,
        )
        .await;
    assert!(result.is_err());

    let Collection::Stock(records) = store.load_collection(EntityKind::Stock).await.unwrap() else {
        panic!("expected stock");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].code, "SKU001");
    assert_eq!(store.revision(EntityKind::Stock).await.unwrap(), 1);
    assert_eq!(queue.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_record_mutation_delete() {
    let (store, queue) = setup_with_queue().await;
    let record = stock("SKU001", "MERKEZ", 1.0);
    store
        .upsert_records(&Collection::Stock(vec![record.clone()]))
        .await
        .unwrap();

    let change = LocalChange::Delete {
        kind: EntityKind::Stock,
        keys: vec![record.composite_key(), "missing".to_string()],
    };
    let recorded = store
        .record_mutation(&change, &stock_update("SKU001"))
        .await
        .unwrap();

    assert_eq!(recorded.affected, 1);
    assert!(store
        .load_collection(EntityKind::Stock)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.revision(EntityKind::Stock).await.unwrap(), 2);
    assert_eq!(queue.len().await.unwrap(), 1);
}
