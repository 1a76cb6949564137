//! Composite-key diff engine
//!
//! Compares a local and a remote collection of the same entity kind. Both
//! sides are indexed by composite key; keys present on one side only land in
//! `only_local` / `only_remote`, keys present on both sides with structurally
//! different records land in `conflicts`, and equal records are dropped.
//!
//! Records are compared through their JSON serialization, so field order
//! never matters and numbers compare by value (`150` equals `150.0`).
//!
//! When one side holds several records with the same key, the last one wins
//! and the earlier ones are counted in [`DiffResult::duplicates`].

use std::collections::HashMap;

use erpsync_core::domain::CompositeKey;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A key present on both sides with differing records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictPair<T> {
    /// Composite key string shared by both records
    pub key: String,
    pub left: T,
    pub right: T,
}

/// Records discarded per side because a later record had the same key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateCounts {
    pub left: usize,
    pub right: usize,
}

/// Outcome of one diff
///
/// All three vectors are sorted by composite key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult<T> {
    pub only_local: Vec<T>,
    pub only_remote: Vec<T>,
    pub conflicts: Vec<ConflictPair<T>>,
    pub duplicates: DuplicateCounts,
}

/// Counts of a diff, for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub only_local: usize,
    pub only_remote: usize,
    pub conflicts: usize,
    pub duplicates_discarded: usize,
}

impl<T> Default for DiffResult<T> {
    fn default() -> Self {
        Self {
            only_local: Vec::new(),
            only_remote: Vec::new(),
            conflicts: Vec::new(),
            duplicates: DuplicateCounts::default(),
        }
    }
}

impl<T> DiffResult<T> {
    /// Returns true if both sides hold exactly the same records
    pub fn is_reconciled(&self) -> bool {
        self.only_local.is_empty() && self.only_remote.is_empty() && self.conflicts.is_empty()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            only_local: self.only_local.len(),
            only_remote: self.only_remote.len(),
            conflicts: self.conflicts.len(),
            duplicates_discarded: self.duplicates.left + self.duplicates.right,
        }
    }

    /// Keys of all conflicting pairs, in order
    pub fn conflict_keys(&self) -> impl Iterator<Item = &str> {
        self.conflicts.iter().map(|pair| pair.key.as_str())
    }

    /// The same diff seen from the other side
    ///
    /// `only_local` and `only_remote` trade places and every conflict pair is
    /// flipped. Equal to diffing with the arguments swapped.
    #[must_use]
    pub fn swap(self) -> Self {
        Self {
            only_local: self.only_remote,
            only_remote: self.only_local,
            conflicts: self
                .conflicts
                .into_iter()
                .map(|pair| ConflictPair {
                    key: pair.key,
                    left: pair.right,
                    right: pair.left,
                })
                .collect(),
            duplicates: DuplicateCounts {
                left: self.duplicates.right,
                right: self.duplicates.left,
            },
        }
    }
}

struct Indexed<'a, T> {
    value: Value,
    record: &'a T,
}

/// Indexes one side by key; later records replace earlier ones
fn index<'a, T: Serialize>(
    records: &'a [T],
    key: &CompositeKey,
) -> (HashMap<String, Indexed<'a, T>>, usize) {
    let mut map = HashMap::with_capacity(records.len());
    let mut discarded = 0;

    for record in records {
        let value = serde_json::to_value(record).unwrap_or(Value::Null);
        let record_key = key.key_of(&value);
        if map.insert(record_key, Indexed { value, record }).is_some() {
            discarded += 1;
        }
    }

    (map, discarded)
}

/// Computes the three-way difference between `left` and `right`
pub fn diff<T: Serialize + Clone>(left: &[T], right: &[T], key: &CompositeKey) -> DiffResult<T> {
    let (left_map, left_dups) = index(left, key);
    let (right_map, right_dups) = index(right, key);

    if left_dups > 0 || right_dups > 0 {
        debug!(
            key = %key,
            left = left_dups,
            right = right_dups,
            "Duplicate composite keys discarded, last occurrence kept"
        );
    }

    let mut only_local = Vec::new();
    let mut conflicts = Vec::new();
    for (record_key, local) in &left_map {
        match right_map.get(record_key) {
            None => only_local.push((record_key, local.record)),
            Some(remote) if !values_equal(&local.value, &remote.value) => {
                conflicts.push(ConflictPair {
                    key: record_key.clone(),
                    left: local.record.clone(),
                    right: remote.record.clone(),
                });
            }
            Some(_) => {}
        }
    }

    let mut only_remote: Vec<_> = right_map
        .iter()
        .filter(|(record_key, _)| !left_map.contains_key(*record_key))
        .map(|(record_key, remote)| (record_key, remote.record))
        .collect();

    only_local.sort_by(|a, b| a.0.cmp(b.0));
    only_remote.sort_by(|a, b| a.0.cmp(b.0));
    conflicts.sort_by(|a, b| a.key.cmp(&b.key));

    DiffResult {
        only_local: only_local.into_iter().map(|(_, r)| r.clone()).collect(),
        only_remote: only_remote.into_iter().map(|(_, r)| r.clone()).collect(),
        conflicts,
        duplicates: DuplicateCounts {
            left: left_dups,
            right: right_dups,
        },
    }
}

/// Deep structural equality over JSON values
///
/// Objects compare as unordered maps; numbers compare by numeric value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}
