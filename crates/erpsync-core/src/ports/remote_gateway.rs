//! Remote gateway port (driven/secondary port)
//!
//! This module defines the interface to the remote ERP system: the four
//! collection reads, the remote-side sync trigger, per-item replay of queued
//! mutations and a cheap reachability check.
//!
//! ## Design Notes
//!
//! - Reads return raw records. No schema is enforced at this boundary;
//!   normalization happens in the record adapters.
//! - Uses `anyhow::Result` because transport errors are adapter-specific.

use crate::adapters::{
    adapt_all, RawInvoiceRecord, RawLedgerRecord, RawQuoteRecord, RawStockRecord,
};
use crate::domain::{
    Collection, EntityKind, Invoice, LedgerEntry, Quote, StockItem, SyncQueueItem,
};

/// Port trait for the remote ERP
#[async_trait::async_trait]
pub trait IRemoteGateway: Send + Sync {
    /// Fetches every stock row
    async fn fetch_stock(&self) -> anyhow::Result<Vec<RawStockRecord>>;

    /// Fetches every invoice header
    async fn fetch_invoices(&self) -> anyhow::Result<Vec<RawInvoiceRecord>>;

    /// Fetches every current-account movement
    async fn fetch_ledger(&self) -> anyhow::Result<Vec<RawLedgerRecord>>;

    /// Fetches every quote header
    async fn fetch_quotes(&self) -> anyhow::Result<Vec<RawQuoteRecord>>;

    /// Asks the remote system to prepare fresh data and waits for it
    async fn trigger_sync(&self) -> anyhow::Result<()>;

    /// Applies one queued mutation on the remote side
    ///
    /// Success means the remote confirmed the write; only then may the item
    /// be removed from the queue.
    async fn apply(&self, item: &SyncQueueItem) -> anyhow::Result<()>;

    /// Returns true if the remote answers a health check
    async fn is_reachable(&self) -> bool;

    /// Fetches one entity kind and normalizes it into a canonical collection
    async fn fetch_collection(&self, kind: EntityKind) -> anyhow::Result<Collection> {
        Ok(match kind {
            EntityKind::Stock => {
                Collection::Stock(adapt_all::<StockItem>(&self.fetch_stock().await?))
            }
            EntityKind::Ledger => {
                Collection::Ledger(adapt_all::<LedgerEntry>(&self.fetch_ledger().await?))
            }
            EntityKind::Invoice => {
                Collection::Invoice(adapt_all::<Invoice>(&self.fetch_invoices().await?))
            }
            EntityKind::Quote => {
                Collection::Quote(adapt_all::<Quote>(&self.fetch_quotes().await?))
            }
        })
    }
}
