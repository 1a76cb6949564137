//! Domain entities and business logic
//!
//! This module contains the core domain types for erpsync:
//! - Entity kinds and composite keys used to match records
//! - Canonical ERP records and typed collections
//! - Currency enumeration
//! - Sync queue items, their state machine and retry policy
//! - Domain-specific error types

pub mod collection;
pub mod currency;
pub mod entity;
pub mod errors;
pub mod newtypes;
pub mod queue;
pub mod records;

// Re-export commonly used types
pub use collection::{Collection, ErpCollections};
pub use currency::Currency;
pub use entity::{display_key, CompositeKey, EntityKind, KEY_SEPARATOR};
pub use errors::DomainError;
pub use newtypes::*;
pub use queue::{LocalChange, QueueItemStatus, QueueOperation, RetryPolicy, SyncQueueItem};
pub use records::{ErpRecord, Invoice, LedgerEntry, Quote, StockItem};
