//! Error types for reconciliation

use erpsync_core::domain::DomainError;
use thiserror::Error;

/// Errors that can occur while computing reconciliation diffs
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Reading one side of the comparison failed
    #[error("failed to read {side} collection for {kind}: {source}")]
    Source {
        side: &'static str,
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    /// Local and remote collections were of different kinds
    #[error(transparent)]
    Domain(#[from] DomainError),
}
