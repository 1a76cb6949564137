//! Typed collections of canonical records
//!
//! A [`Collection`] holds every record of one entity kind. It is the unit
//! exchanged between the query cache, the local store and the
//! reconciliation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::EntityKind;
use super::records::{Invoice, LedgerEntry, Quote, StockItem};

/// All records of one entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "records", rename_all = "snake_case")]
pub enum Collection {
    Stock(Vec<StockItem>),
    Ledger(Vec<LedgerEntry>),
    Invoice(Vec<Invoice>),
    Quote(Vec<Quote>),
}

impl Collection {
    /// An empty collection of the given kind
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Stock => Collection::Stock(Vec::new()),
            EntityKind::Ledger => Collection::Ledger(Vec::new()),
            EntityKind::Invoice => Collection::Invoice(Vec::new()),
            EntityKind::Quote => Collection::Quote(Vec::new()),
        }
    }

    /// The entity kind held by this collection
    pub fn kind(&self) -> EntityKind {
        match self {
            Collection::Stock(_) => EntityKind::Stock,
            Collection::Ledger(_) => EntityKind::Ledger,
            Collection::Invoice(_) => EntityKind::Invoice,
            Collection::Quote(_) => EntityKind::Quote,
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        match self {
            Collection::Stock(records) => records.len(),
            Collection::Ledger(records) => records.len(),
            Collection::Invoice(records) => records.len(),
            Collection::Quote(records) => records.len(),
        }
    }

    /// Returns true if the collection holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes every record to a JSON value
    pub fn to_values(&self) -> Result<Vec<Value>, serde_json::Error> {
        fn values<T: Serialize>(records: &[T]) -> Result<Vec<Value>, serde_json::Error> {
            records.iter().map(serde_json::to_value).collect()
        }

        match self {
            Collection::Stock(records) => values(records),
            Collection::Ledger(records) => values(records),
            Collection::Invoice(records) => values(records),
            Collection::Quote(records) => values(records),
        }
    }

    /// Rebuilds a collection from serialized canonical records
    pub fn from_values(kind: EntityKind, values: Vec<Value>) -> Result<Self, serde_json::Error> {
        fn records<T: serde::de::DeserializeOwned>(
            values: Vec<Value>,
        ) -> Result<Vec<T>, serde_json::Error> {
            values.into_iter().map(serde_json::from_value).collect()
        }

        Ok(match kind {
            EntityKind::Stock => Collection::Stock(records(values)?),
            EntityKind::Ledger => Collection::Ledger(records(values)?),
            EntityKind::Invoice => Collection::Invoice(records(values)?),
            EntityKind::Quote => Collection::Quote(records(values)?),
        })
    }
}

/// The four canonical collections, labelled the way the UI layer expects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErpCollections {
    #[serde(rename = "stoklar")]
    pub stock: Vec<StockItem>,
    #[serde(rename = "faturalar")]
    pub invoices: Vec<Invoice>,
    #[serde(rename = "cariHareketler")]
    pub ledger: Vec<LedgerEntry>,
    #[serde(rename = "teklifler")]
    pub quotes: Vec<Quote>,
}

impl ErpCollections {
    /// Stores a collection in the matching slot
    pub fn insert(&mut self, collection: Collection) {
        match collection {
            Collection::Stock(records) => self.stock = records,
            Collection::Ledger(records) => self.ledger = records,
            Collection::Invoice(records) => self.invoices = records,
            Collection::Quote(records) => self.quotes = records,
        }
    }

    /// Record count for one kind
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Stock => self.stock.len(),
            EntityKind::Ledger => self.ledger.len(),
            EntityKind::Invoice => self.invoices.len(),
            EntityKind::Quote => self.quotes.len(),
        }
    }
}
