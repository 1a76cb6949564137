//! Entity kinds and composite keys
//!
//! Every tracked ERP collection is identified by an [`EntityKind`]. Records
//! of one kind are matched across the local and remote side by a
//! [`CompositeKey`]: an ordered list of field names whose values, joined
//! with [`KEY_SEPARATOR`], identify the record.
//!
//! | Kind      | Key fields                                  |
//! |-----------|---------------------------------------------|
//! | `stock`   | `code`, `warehouse`                         |
//! | `ledger`  | `accountCode`, `date`, `documentNumber`     |
//! | `invoice` | `invoiceNumber`, `date`                     |
//! | `quote`   | `quoteNumber`, `date`                       |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DomainError;

/// Separator placed between key field values (ASCII unit separator)
pub const KEY_SEPARATOR: char = '\u{1f}';

/// A tracked ERP collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Stock items per warehouse
    Stock,
    /// Current-account (ledger) movements
    Ledger,
    /// Sales and purchase invoices
    Invoice,
    /// Sales quotes
    Quote,
}

impl EntityKind {
    /// All tracked kinds, in reconciliation order
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Stock,
        EntityKind::Ledger,
        EntityKind::Invoice,
        EntityKind::Quote,
    ];

    /// Stable lowercase name used in storage and on the wire
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Stock => "stock",
            EntityKind::Ledger => "ledger",
            EntityKind::Invoice => "invoice",
            EntityKind::Quote => "quote",
        }
    }

    /// Collection label used by the UI layer
    pub fn collection_label(&self) -> &'static str {
        match self {
            EntityKind::Stock => "stoklar",
            EntityKind::Ledger => "cariHareketler",
            EntityKind::Invoice => "faturalar",
            EntityKind::Quote => "teklifler",
        }
    }

    /// The composite key used to match records of this kind
    pub fn composite_key(&self) -> CompositeKey {
        let fields: &[&str] = match self {
            EntityKind::Stock => &["code", "warehouse"],
            EntityKind::Ledger => &["accountCode", "date", "documentNumber"],
            EntityKind::Invoice => &["invoiceNumber", "date"],
            EntityKind::Quote => &["quoteNumber", "date"],
        };
        CompositeKey::new(fields.iter().copied())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" | "stocks" | "stoklar" => Ok(EntityKind::Stock),
            "ledger" | "cari" | "carihareketler" => Ok(EntityKind::Ledger),
            "invoice" | "invoices" | "faturalar" => Ok(EntityKind::Invoice),
            "quote" | "quotes" | "teklifler" => Ok(EntityKind::Quote),
            other => Err(DomainError::UnknownEntity(other.to_string())),
        }
    }
}

/// Ordered list of field names identifying a record within one entity kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    fields: Vec<String>,
}

impl CompositeKey {
    /// Creates a key from field names, in matching order
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Field names making up the key
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Computes the key string of a serialized record
    ///
    /// Missing fields (and non-object records) contribute an empty segment,
    /// so two records missing the same key fields collapse to the same key.
    pub fn key_of(&self, record: &Value) -> String {
        let mut key = String::new();
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(&key_segment(record.get(field)));
        }
        key
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.fields.join(", "))
    }
}

/// String form of one key field value
fn key_segment(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Renders a key string for humans (separator replaced by ` / `)
pub fn display_key(key: &str) -> String {
    key.split(KEY_SEPARATOR).collect::<Vec<_>>().join(" / ")
}
