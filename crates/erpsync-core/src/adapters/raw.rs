//! Raw remote record types
//!
//! The ERP export is not consistent about field naming: the same column may
//! arrive as `stockCode`, `stock_code` or `stokKodu` depending on the report
//! that produced it. Each raw type reads every field from the first present,
//! non-null key in a fallback list. Lists start with the canonical camelCase
//! name, then snake_case, then the ERP's Turkish column names.
//!
//! Reading a raw record never fails: a non-object input yields an all-empty
//! record and unknown keys are ignored.
//!
//! ## Stock
//!
//! | Field        | Source keys |
//! |--------------|-------------|
//! | `code`       | `code`, `stockCode`, `stock_code`, `sku`, `stokKodu`, `stok_kodu` |
//! | `warehouse`  | `warehouse`, `warehouseCode`, `warehouse_code`, `depo`, `depoKodu`, `depo_kodu` |
//! | `name`       | `name`, `stockName`, `stock_name`, `description`, `stokAdi`, `stok_adi` |
//! | `quantity`   | `quantity`, `qty`, `miktar` |
//! | `unit`       | `unit`, `birim` |
//! | `unit_price` | `unitPrice`, `unit_price`, `price`, `birimFiyat`, `fiyat` |
//! | `currency`   | `currency`, `currencyCode`, `currency_code`, `doviz`, `dovizCinsi` |
//! | `updated_at` | `updatedAt`, `updated_at`, `lastModified`, `guncellemeTarihi` |
//!
//! ## Ledger
//!
//! | Field             | Source keys |
//! |-------------------|-------------|
//! | `account_code`    | `accountCode`, `account_code`, `cariKodu`, `cari_kodu` |
//! | `date`            | `date`, `documentDate`, `document_date`, `tarih` |
//! | `document_number` | `documentNumber`, `document_number`, `documentNo`, `belgeNo`, `belge_no`, `evrakNo` |
//! | `account_name`    | `accountName`, `account_name`, `cariAdi`, `cari_adi`, `unvan` |
//! | `description`     | `description`, `aciklama` |
//! | `debit`           | `debit`, `borc` |
//! | `credit`          | `credit`, `alacak` |
//! | `balance`         | `balance`, `bakiye` |
//! | `currency`        | as for stock |
//!
//! ## Invoice
//!
//! | Field            | Source keys |
//! |------------------|-------------|
//! | `invoice_number` | `invoiceNumber`, `invoice_number`, `invoiceNo`, `faturaNo`, `fatura_no` |
//! | `date`           | `date`, `invoiceDate`, `invoice_date`, `faturaTarihi`, `tarih` |
//! | `customer_code`  | `customerCode`, `customer_code`, `cariKodu`, `cari_kodu` |
//! | `customer_name`  | `customerName`, `customer_name`, `cariAdi`, `cari_adi`, `unvan` |
//! | `net_total`      | `netTotal`, `net_total`, `subtotal`, `araToplam` |
//! | `vat_total`      | `vatTotal`, `vat_total`, `taxTotal`, `kdv`, `kdvTutari` |
//! | `grand_total`    | `grandTotal`, `grand_total`, `total`, `genelToplam` |
//! | `currency`       | as for stock |
//! | `status`         | `status`, `durum` |
//!
//! ## Quote
//!
//! | Field           | Source keys |
//! |-----------------|-------------|
//! | `quote_number`  | `quoteNumber`, `quote_number`, `quoteNo`, `teklifNo`, `teklif_no` |
//! | `date`          | `date`, `quoteDate`, `quote_date`, `teklifTarihi`, `tarih` |
//! | `customer_code` | as for invoice |
//! | `customer_name` | as for invoice |
//! | `total`         | `total`, `grandTotal`, `grand_total`, `amount`, `toplam`, `genelToplam` |
//! | `currency`      | as for stock |
//! | `status`        | `status`, `durum` |
//! | `valid_until`   | `validUntil`, `valid_until`, `expiryDate`, `gecerlilikTarihi` |

use serde_json::{Map, Value};

const CURRENCY_KEYS: &[&str] = &[
    "currency",
    "currencyCode",
    "currency_code",
    "doviz",
    "dovizCinsi",
];
const CUSTOMER_CODE_KEYS: &[&str] = &["customerCode", "customer_code", "cariKodu", "cari_kodu"];
const CUSTOMER_NAME_KEYS: &[&str] = &[
    "customerName",
    "customer_name",
    "cariAdi",
    "cari_adi",
    "unvan",
];
const STATUS_KEYS: &[&str] = &["status", "durum"];

/// Returns the first present, non-null value among `keys`
fn pick(object: Option<&Map<String, Value>>, keys: &[&str]) -> Option<Value> {
    let object = object?;
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
        .cloned()
}

/// A stock row as exported by the ERP
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStockRecord {
    pub code: Option<Value>,
    pub warehouse: Option<Value>,
    pub name: Option<Value>,
    pub quantity: Option<Value>,
    pub unit: Option<Value>,
    pub unit_price: Option<Value>,
    pub currency: Option<Value>,
    pub updated_at: Option<Value>,
}

impl RawStockRecord {
    pub fn from_json(value: &Value) -> Self {
        let object = value.as_object();
        Self {
            code: pick(
                object,
                &["code", "stockCode", "stock_code", "sku", "stokKodu", "stok_kodu"],
            ),
            warehouse: pick(
                object,
                &[
                    "warehouse",
                    "warehouseCode",
                    "warehouse_code",
                    "depo",
                    "depoKodu",
                    "depo_kodu",
                ],
            ),
            name: pick(
                object,
                &["name", "stockName", "stock_name", "description", "stokAdi", "stok_adi"],
            ),
            quantity: pick(object, &["quantity", "qty", "miktar"]),
            unit: pick(object, &["unit", "birim"]),
            unit_price: pick(
                object,
                &["unitPrice", "unit_price", "price", "birimFiyat", "fiyat"],
            ),
            currency: pick(object, CURRENCY_KEYS),
            updated_at: pick(
                object,
                &["updatedAt", "updated_at", "lastModified", "guncellemeTarihi"],
            ),
        }
    }
}

/// A current-account movement as exported by the ERP
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLedgerRecord {
    pub account_code: Option<Value>,
    pub date: Option<Value>,
    pub document_number: Option<Value>,
    pub account_name: Option<Value>,
    pub description: Option<Value>,
    pub debit: Option<Value>,
    pub credit: Option<Value>,
    pub balance: Option<Value>,
    pub currency: Option<Value>,
}

impl RawLedgerRecord {
    pub fn from_json(value: &Value) -> Self {
        let object = value.as_object();
        Self {
            account_code: pick(object, &["accountCode", "account_code", "cariKodu", "cari_kodu"]),
            date: pick(object, &["date", "documentDate", "document_date", "tarih"]),
            document_number: pick(
                object,
                &[
                    "documentNumber",
                    "document_number",
                    "documentNo",
                    "belgeNo",
                    "belge_no",
                    "evrakNo",
                ],
            ),
            account_name: pick(
                object,
                &["accountName", "account_name", "cariAdi", "cari_adi", "unvan"],
            ),
            description: pick(object, &["description", "aciklama"]),
            debit: pick(object, &["debit", "borc"]),
            credit: pick(object, &["credit", "alacak"]),
            balance: pick(object, &["balance", "bakiye"]),
            currency: pick(object, CURRENCY_KEYS),
        }
    }
}

/// An invoice header as exported by the ERP
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInvoiceRecord {
    pub invoice_number: Option<Value>,
    pub date: Option<Value>,
    pub customer_code: Option<Value>,
    pub customer_name: Option<Value>,
    pub net_total: Option<Value>,
    pub vat_total: Option<Value>,
    pub grand_total: Option<Value>,
    pub currency: Option<Value>,
    pub status: Option<Value>,
}

impl RawInvoiceRecord {
    pub fn from_json(value: &Value) -> Self {
        let object = value.as_object();
        Self {
            invoice_number: pick(
                object,
                &["invoiceNumber", "invoice_number", "invoiceNo", "faturaNo", "fatura_no"],
            ),
            date: pick(
                object,
                &["date", "invoiceDate", "invoice_date", "faturaTarihi", "tarih"],
            ),
            customer_code: pick(object, CUSTOMER_CODE_KEYS),
            customer_name: pick(object, CUSTOMER_NAME_KEYS),
            net_total: pick(object, &["netTotal", "net_total", "subtotal", "araToplam"]),
            vat_total: pick(
                object,
                &["vatTotal", "vat_total", "taxTotal", "kdv", "kdvTutari"],
            ),
            grand_total: pick(object, &["grandTotal", "grand_total", "total", "genelToplam"]),
            currency: pick(object, CURRENCY_KEYS),
            status: pick(object, STATUS_KEYS),
        }
    }
}

/// A sales quote header as exported by the ERP
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuoteRecord {
    pub quote_number: Option<Value>,
    pub date: Option<Value>,
    pub customer_code: Option<Value>,
    pub customer_name: Option<Value>,
    pub total: Option<Value>,
    pub currency: Option<Value>,
    pub status: Option<Value>,
    pub valid_until: Option<Value>,
}

impl RawQuoteRecord {
    pub fn from_json(value: &Value) -> Self {
        let object = value.as_object();
        Self {
            quote_number: pick(
                object,
                &["quoteNumber", "quote_number", "quoteNo", "teklifNo", "teklif_no"],
            ),
            date: pick(
                object,
                &["date", "quoteDate", "quote_date", "teklifTarihi", "tarih"],
            ),
            customer_code: pick(object, CUSTOMER_CODE_KEYS),
            customer_name: pick(object, CUSTOMER_NAME_KEYS),
            total: pick(
                object,
                &["total", "grandTotal", "grand_total", "amount", "toplam", "genelToplam"],
            ),
            currency: pick(object, CURRENCY_KEYS),
            status: pick(object, STATUS_KEYS),
            valid_until: pick(
                object,
                &["validUntil", "valid_until", "expiryDate", "gecerlilikTarihi"],
            ),
        }
    }
}

impl From<Value> for RawStockRecord {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl From<Value> for RawLedgerRecord {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl From<Value> for RawInvoiceRecord {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl From<Value> for RawQuoteRecord {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}
