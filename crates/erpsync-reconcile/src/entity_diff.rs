//! Typed diffs over canonical collections

use erpsync_core::domain::{
    Collection, DomainError, EntityKind, ErpRecord, Invoice, LedgerEntry, Quote, StockItem,
};
use serde::Serialize;

use crate::diff::{diff, DiffResult, DiffSummary};

/// The diff of one entity kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entity", content = "diff", rename_all = "snake_case")]
pub enum EntityDiff {
    Stock(DiffResult<StockItem>),
    Ledger(DiffResult<LedgerEntry>),
    Invoice(DiffResult<Invoice>),
    Quote(DiffResult<Quote>),
}

fn diff_records<T: ErpRecord>(local: &[T], remote: &[T]) -> DiffResult<T> {
    diff(local, remote, &T::KIND.composite_key())
}

impl EntityDiff {
    /// Diffs a local against a remote collection of the same kind
    pub fn compute(local: &Collection, remote: &Collection) -> Result<Self, DomainError> {
        Ok(match (local, remote) {
            (Collection::Stock(l), Collection::Stock(r)) => EntityDiff::Stock(diff_records(l, r)),
            (Collection::Ledger(l), Collection::Ledger(r)) => {
                EntityDiff::Ledger(diff_records(l, r))
            }
            (Collection::Invoice(l), Collection::Invoice(r)) => {
                EntityDiff::Invoice(diff_records(l, r))
            }
            (Collection::Quote(l), Collection::Quote(r)) => EntityDiff::Quote(diff_records(l, r)),
            (l, r) => {
                return Err(DomainError::KindMismatch {
                    expected: l.kind().to_string(),
                    actual: r.kind().to_string(),
                })
            }
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDiff::Stock(_) => EntityKind::Stock,
            EntityDiff::Ledger(_) => EntityKind::Ledger,
            EntityDiff::Invoice(_) => EntityKind::Invoice,
            EntityDiff::Quote(_) => EntityKind::Quote,
        }
    }

    pub fn summary(&self) -> DiffSummary {
        match self {
            EntityDiff::Stock(d) => d.summary(),
            EntityDiff::Ledger(d) => d.summary(),
            EntityDiff::Invoice(d) => d.summary(),
            EntityDiff::Quote(d) => d.summary(),
        }
    }

    pub fn is_reconciled(&self) -> bool {
        match self {
            EntityDiff::Stock(d) => d.is_reconciled(),
            EntityDiff::Ledger(d) => d.is_reconciled(),
            EntityDiff::Invoice(d) => d.is_reconciled(),
            EntityDiff::Quote(d) => d.is_reconciled(),
        }
    }

    /// Composite key strings of every differing record, grouped by outcome
    ///
    /// Returns `(only_local, only_remote, conflicts)`.
    pub fn keys(&self) -> (Vec<String>, Vec<String>, Vec<String>) {
        fn keys_of<T: ErpRecord>(d: &DiffResult<T>) -> (Vec<String>, Vec<String>, Vec<String>) {
            (
                d.only_local.iter().map(T::composite_key).collect(),
                d.only_remote.iter().map(T::composite_key).collect(),
                d.conflict_keys().map(str::to_string).collect(),
            )
        }

        match self {
            EntityDiff::Stock(d) => keys_of(d),
            EntityDiff::Ledger(d) => keys_of(d),
            EntityDiff::Invoice(d) => keys_of(d),
            EntityDiff::Quote(d) => keys_of(d),
        }
    }
}
