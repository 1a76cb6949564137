//! erpsync Reconcile - local-vs-remote reconciliation
//!
//! Provides:
//! - A composite-key diff engine producing three-way results
//!   (only local, only remote, conflicting pairs)
//! - Typed per-entity diffs over canonical collections
//! - A reconciliation service that recomputes a kind's diff only when one
//!   of its two sides changed
//!
//! Nothing in this crate writes to the local store or the remote system.

pub mod diff;
pub mod entity_diff;
pub mod error;
pub mod service;

pub use diff::{diff, values_equal, ConflictPair, DiffResult, DiffSummary, DuplicateCounts};
pub use entity_diff::EntityDiff;
pub use error::ReconcileError;
pub use service::{ReconciliationService, ReconciliationSnapshot};
