//! Canonical ERP records
//!
//! These are the normalized, type-safe shapes produced by the record
//! adapters and stored by the local store. Field names serialize in
//! camelCase so that composite key field names (see
//! [`EntityKind::composite_key`]) refer to serialized fields.
//!
//! Numeric fields are `Option<f64>`: `None` means the source value could not
//! be interpreted as a number, which is different from zero.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::collection::Collection;
use super::currency::Currency;
use super::entity::EntityKind;

/// Behaviour shared by every canonical record type
pub trait ErpRecord:
    Serialize + DeserializeOwned + Clone + PartialEq + Debug + Send + Sync + 'static
{
    /// The entity kind this record type belongs to
    const KIND: EntityKind;

    /// Wraps a vector of records into a [`Collection`]
    fn into_collection(records: Vec<Self>) -> Collection;

    /// Borrows the records of a collection if it holds this record type
    fn from_collection(collection: &Collection) -> Option<&[Self]>;

    /// Composite key string of this record
    fn composite_key(&self) -> String {
        serde_json::to_value(self)
            .map(|value| Self::KIND.composite_key().key_of(&value))
            .unwrap_or_default()
    }
}

/// A stock item held in one warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub code: String,
    pub warehouse: String,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: String,
    pub unit_price: Option<f64>,
    pub currency: Currency,
    pub updated_at: DateTime<Utc>,
}

/// A current-account (cari) movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub account_code: String,
    pub date: DateTime<Utc>,
    pub document_number: String,
    pub account_name: String,
    pub description: String,
    pub debit: Option<f64>,
    pub credit: Option<f64>,
    pub balance: Option<f64>,
    pub currency: Currency,
}

/// An invoice header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,
    pub date: DateTime<Utc>,
    pub customer_code: String,
    pub customer_name: String,
    pub net_total: Option<f64>,
    pub vat_total: Option<f64>,
    pub grand_total: Option<f64>,
    pub currency: Currency,
    pub status: String,
}

/// A sales quote header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub quote_number: String,
    pub date: DateTime<Utc>,
    pub customer_code: String,
    pub customer_name: String,
    pub total: Option<f64>,
    pub currency: Currency,
    pub status: String,
    pub valid_until: Option<DateTime<Utc>>,
}

impl ErpRecord for StockItem {
    const KIND: EntityKind = EntityKind::Stock;

    fn into_collection(records: Vec<Self>) -> Collection {
        Collection::Stock(records)
    }

    fn from_collection(collection: &Collection) -> Option<&[Self]> {
        match collection {
            Collection::Stock(records) => Some(records),
            _ => None,
        }
    }
}

impl ErpRecord for LedgerEntry {
    const KIND: EntityKind = EntityKind::Ledger;

    fn into_collection(records: Vec<Self>) -> Collection {
        Collection::Ledger(records)
    }

    fn from_collection(collection: &Collection) -> Option<&[Self]> {
        match collection {
            Collection::Ledger(records) => Some(records),
            _ => None,
        }
    }
}

impl ErpRecord for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;

    fn into_collection(records: Vec<Self>) -> Collection {
        Collection::Invoice(records)
    }

    fn from_collection(collection: &Collection) -> Option<&[Self]> {
        match collection {
            Collection::Invoice(records) => Some(records),
            _ => None,
        }
    }
}

impl ErpRecord for Quote {
    const KIND: EntityKind = EntityKind::Quote;

    fn into_collection(records: Vec<Self>) -> Collection {
        Collection::Quote(records)
    }

    fn from_collection(collection: &Collection) -> Option<&[Self]> {
        match collection {
            Collection::Quote(records) => Some(records),
            _ => None,
        }
    }
}
