//! Properties of the composite-key diff engine

use std::collections::BTreeSet;

use erpsync_core::domain::CompositeKey;
use erpsync_reconcile::diff;
use serde_json::{json, Value};

fn key() -> CompositeKey {
    CompositeKey::new(["code", "warehouse"])
}

fn record(code: &str, warehouse: &str, qty: i64) -> Value {
    json!({"code": code, "warehouse": warehouse, "qty": qty})
}

fn keys_of(records: &[Value]) -> BTreeSet<String> {
    records.iter().map(|r| key().key_of(r)).collect()
}

fn sample() -> (Vec<Value>, Vec<Value>) {
    let local = vec![
        record("SKU001", "MERKEZ", 150),
        record("SKU002", "MERKEZ", 10),
        record("SKU003", "DEPO2", 5),
        record("SKU004", "MERKEZ", 1),
    ];
    let remote = vec![
        record("SKU001", "MERKEZ", 140),
        record("SKU002", "MERKEZ", 10),
        record("SKU005", "DEPO2", 7),
        record("SKU004", "MERKEZ", 2),
    ];
    (local, remote)
}

#[test]
fn outputs_cover_every_key_and_are_disjoint() {
    let (local, remote) = sample();
    let result = diff(&local, &remote, &key());

    let only_local = keys_of(&result.only_local);
    let only_remote = keys_of(&result.only_remote);
    let conflicts: BTreeSet<String> = result.conflict_keys().map(str::to_string).collect();

    // Keys matched on both sides with equal records
    let all_left = keys_of(&local);
    let all_right = keys_of(&remote);
    let matched: BTreeSet<String> = all_left.intersection(&all_right).cloned().collect();

    let mut union: BTreeSet<String> = only_local.union(&only_remote).cloned().collect();
    union.extend(matched.iter().cloned());
    let expected: BTreeSet<String> = all_left.union(&all_right).cloned().collect();
    assert_eq!(union, expected);

    assert!(only_local.is_disjoint(&only_remote));
    assert!(only_local.is_disjoint(&conflicts));
    assert!(only_remote.is_disjoint(&conflicts));
    assert!(conflicts.is_subset(&matched));
}

#[test]
fn diff_is_deterministic() {
    let (local, remote) = sample();
    let first = diff(&local, &remote, &key());
    let second = diff(&local, &remote, &key());
    assert_eq!(first, second);
}

#[test]
fn swapping_inputs_swaps_outputs() {
    let (local, remote) = sample();
    let forward = diff(&local, &remote, &key());
    let backward = diff(&remote, &local, &key());

    assert_eq!(forward.only_local, backward.only_remote);
    assert_eq!(forward.only_remote, backward.only_local);

    let forward_keys: Vec<_> = forward.conflict_keys().collect();
    let backward_keys: Vec<_> = backward.conflict_keys().collect();
    assert_eq!(forward_keys, backward_keys);
    for (f, b) in forward.conflicts.iter().zip(&backward.conflicts) {
        assert_eq!(f.left, b.right);
        assert_eq!(f.right, b.left);
    }

    assert_eq!(forward.swap(), backward);
}

#[test]
fn stock_quantity_mismatch_is_single_conflict() {
    let local = vec![json!({"code": "SKU001", "warehouse": "MERKEZ", "qty": 150})];
    let remote = vec![json!({"code": "SKU001", "warehouse": "MERKEZ", "qty": 140})];

    let result = diff(&local, &remote, &key());

    assert!(result.only_local.is_empty());
    assert!(result.only_remote.is_empty());
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].left, local[0]);
    assert_eq!(result.conflicts[0].right, remote[0]);
}

#[test]
fn extra_records_land_on_their_own_side() {
    let local = vec![
        record("SKU001", "MERKEZ", 1),
        record("LOCAL", "MERKEZ", 1),
    ];
    let remote = vec![
        record("SKU001", "MERKEZ", 1),
        record("REMOTE", "MERKEZ", 1),
    ];

    let result = diff(&local, &remote, &key());

    assert_eq!(result.only_local, vec![record("LOCAL", "MERKEZ", 1)]);
    assert_eq!(result.only_remote, vec![record("REMOTE", "MERKEZ", 1)]);
    assert!(result.conflicts.is_empty());
}

#[test]
fn reordered_fields_reconcile() {
    let local: Vec<Value> = vec![serde_json::from_str(
        r#"{"code":"SKU001","warehouse":"MERKEZ","qty":150,"name":"Drill"}"#,
    )
    .unwrap()];
    let remote: Vec<Value> = vec![serde_json::from_str(
        r#"{"name":"Drill","qty":150,"warehouse":"MERKEZ","code":"SKU001"}"#,
    )
    .unwrap()];

    assert!(diff(&local, &remote, &key()).is_reconciled());
}

#[test]
fn duplicate_keys_keep_last_occurrence() {
    let local = vec![
        record("SKU001", "MERKEZ", 1),
        record("SKU001", "MERKEZ", 2),
        record("SKU001", "MERKEZ", 3),
    ];
    let remote = vec![record("SKU001", "MERKEZ", 2)];

    let result = diff(&local, &remote, &key());

    assert_eq!(result.duplicates.left, 2);
    assert_eq!(result.duplicates.right, 0);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].left["qty"], 3);
}
