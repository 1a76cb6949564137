//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteGateway`] - Remote ERP reads, sync trigger and queue replay
//! - [`ILocalStore`] - Persisted local copies of each entity kind
//! - [`ISyncQueue`] - FIFO backlog of mutations awaiting replay
//! - [`ICollectionSource`] - Revisioned read access used by reconciliation
//! - [`INotificationService`] - User-visible notifications

pub mod collection_source;
pub mod local_store;
pub mod notification;
pub mod remote_gateway;

pub use collection_source::{ICollectionSource, VersionedCollection};
pub use local_store::{ILocalStore, ISyncQueue, RecordedMutation};
pub use notification::{
    INotificationService, Notification, NotificationCategory, NotificationPriority,
};
pub use remote_gateway::IRemoteGateway;
