//! Domain error types
//!
//! Errors raised by domain operations: invalid queue state transitions,
//! unknown entity or operation names, and mismatched collections.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Entity name that does not map to a tracked entity kind
    #[error("Unknown entity kind: {0}")]
    UnknownEntity(String),

    /// Operation name that does not map to a queue operation
    #[error("Unknown queue operation: {0}")]
    UnknownOperation(String),

    /// Two collections of different entity kinds were combined
    #[error("Collection kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// The entity kind the caller asked for
        expected: String,
        /// The entity kind that was supplied
        actual: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
