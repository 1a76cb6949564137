//! Record adapters
//!
//! Pure functions turning raw remote records into canonical records. Adapters
//! never fail: malformed input degrades to defaults.
//!
//! - identity and text fields become strings (missing → empty string)
//! - numeric fields go through [`numeric::parse_number`] (invalid → `None`)
//! - currency codes outside [`Currency`] collapse to [`Currency::FALLBACK`]
//! - dates go through [`date::coerce_date`] (invalid → now)
//! - missing units become `"ADET"`, missing document statuses `"draft"`

pub mod date;
pub mod numeric;
pub mod raw;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{
    Collection, Currency, EntityKind, ErpRecord, Invoice, LedgerEntry, Quote, StockItem,
};

pub use self::raw::{RawInvoiceRecord, RawLedgerRecord, RawQuoteRecord, RawStockRecord};

use self::date::{coerce_date, coerce_optional_date};
use self::numeric::parse_number;

/// Unit used when a stock row carries none
pub const DEFAULT_UNIT: &str = "ADET";

/// Status used when an invoice or quote carries none
pub const DEFAULT_STATUS: &str = "draft";

/// A canonical record that can be built from its raw remote shape
pub trait FromRaw: ErpRecord {
    /// Raw input type read from the remote gateway
    type Raw: From<Value> + Send + Sync;

    /// Normalizes a raw record; `now` substitutes unparseable dates
    fn from_raw(raw: &Self::Raw, now: DateTime<Utc>) -> Self;
}

// ============================================================================
// Field coercion
// ============================================================================

/// String form of an identity or text field
///
/// Strings are trimmed, numbers and booleans use their textual form. Arrays,
/// objects, null and missing values give `None`.
pub fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    as_text(value)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn text(value: Option<&Value>) -> String {
    as_text(value).unwrap_or_default()
}

/// Restricts a currency field to the known enumeration
pub fn coerce_currency(value: Option<&Value>) -> Currency {
    value
        .and_then(Value::as_str)
        .and_then(Currency::from_code)
        .unwrap_or(Currency::FALLBACK)
}

// ============================================================================
// Adapters
// ============================================================================

impl FromRaw for StockItem {
    type Raw = RawStockRecord;

    fn from_raw(raw: &RawStockRecord, now: DateTime<Utc>) -> Self {
        Self {
            code: text(raw.code.as_ref()),
            warehouse: text(raw.warehouse.as_ref()),
            name: text(raw.name.as_ref()),
            quantity: parse_number(raw.quantity.as_ref()),
            unit: text_or(raw.unit.as_ref(), DEFAULT_UNIT),
            unit_price: parse_number(raw.unit_price.as_ref()),
            currency: coerce_currency(raw.currency.as_ref()),
            updated_at: coerce_date(raw.updated_at.as_ref(), now),
        }
    }
}

impl FromRaw for LedgerEntry {
    type Raw = RawLedgerRecord;

    fn from_raw(raw: &RawLedgerRecord, now: DateTime<Utc>) -> Self {
        Self {
            account_code: text(raw.account_code.as_ref()),
            date: coerce_date(raw.date.as_ref(), now),
            document_number: text(raw.document_number.as_ref()),
            account_name: text(raw.account_name.as_ref()),
            description: text(raw.description.as_ref()),
            debit: parse_number(raw.debit.as_ref()),
            credit: parse_number(raw.credit.as_ref()),
            balance: parse_number(raw.balance.as_ref()),
            currency: coerce_currency(raw.currency.as_ref()),
        }
    }
}

impl FromRaw for Invoice {
    type Raw = RawInvoiceRecord;

    fn from_raw(raw: &RawInvoiceRecord, now: DateTime<Utc>) -> Self {
        Self {
            invoice_number: text(raw.invoice_number.as_ref()),
            date: coerce_date(raw.date.as_ref(), now),
            customer_code: text(raw.customer_code.as_ref()),
            customer_name: text(raw.customer_name.as_ref()),
            net_total: parse_number(raw.net_total.as_ref()),
            vat_total: parse_number(raw.vat_total.as_ref()),
            grand_total: parse_number(raw.grand_total.as_ref()),
            currency: coerce_currency(raw.currency.as_ref()),
            status: text_or(raw.status.as_ref(), DEFAULT_STATUS),
        }
    }
}

impl FromRaw for Quote {
    type Raw = RawQuoteRecord;

    fn from_raw(raw: &RawQuoteRecord, now: DateTime<Utc>) -> Self {
        Self {
            quote_number: text(raw.quote_number.as_ref()),
            date: coerce_date(raw.date.as_ref(), now),
            customer_code: text(raw.customer_code.as_ref()),
            customer_name: text(raw.customer_name.as_ref()),
            total: parse_number(raw.total.as_ref()),
            currency: coerce_currency(raw.currency.as_ref()),
            status: text_or(raw.status.as_ref(), DEFAULT_STATUS),
            valid_until: coerce_optional_date(raw.valid_until.as_ref(), now),
        }
    }
}

pub fn adapt_stock(raw: &RawStockRecord) -> StockItem {
    StockItem::from_raw(raw, Utc::now())
}

pub fn adapt_ledger(raw: &RawLedgerRecord) -> LedgerEntry {
    LedgerEntry::from_raw(raw, Utc::now())
}

pub fn adapt_invoice(raw: &RawInvoiceRecord) -> Invoice {
    Invoice::from_raw(raw, Utc::now())
}

pub fn adapt_quote(raw: &RawQuoteRecord) -> Quote {
    Quote::from_raw(raw, Utc::now())
}

/// Adapts a whole fetch, using a single "now" for every defaulted date
pub fn adapt_all<T: FromRaw>(raws: &[T::Raw]) -> Vec<T> {
    let now = Utc::now();
    raws.iter().map(|raw| T::from_raw(raw, now)).collect()
}

/// Adapts one loosely-typed record of the given kind into a one-record
/// collection
pub fn adapt_value(kind: EntityKind, value: &Value, now: DateTime<Utc>) -> Collection {
    fn one<T: FromRaw>(value: &Value, now: DateTime<Utc>) -> Collection {
        let raw = T::Raw::from(value.clone());
        T::into_collection(vec![T::from_raw(&raw, now)])
    }

    match kind {
        EntityKind::Stock => one::<StockItem>(value, now),
        EntityKind::Ledger => one::<LedgerEntry>(value, now),
        EntityKind::Invoice => one::<Invoice>(value, now),
        EntityKind::Quote => one::<Quote>(value, now),
    }
}
