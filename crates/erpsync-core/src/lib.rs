//! erpsync Core - Domain logic for local-vs-ERP reconciliation
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `StockItem`, `LedgerEntry`, `Invoice`, `Quote`, `SyncQueueItem`
//! - **Record adapters** - Raw remote records and their normalization into canonical records
//! - **Port definitions** - Traits for adapters: `IRemoteGateway`, `ILocalStore`,
//!   `ISyncQueue`, `ICollectionSource`, `INotificationService`
//! - **Configuration** - YAML-backed settings with validation
//!
//! # Architecture
//!
//! The domain and adapters modules are pure: no I/O and no async.
//! Ports define trait interfaces that the storage, gateway and sync crates
//! implement or consume.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
