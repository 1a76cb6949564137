//! Currency codes accepted by canonical records

use std::fmt;

use serde::{Deserialize, Serialize};

/// Currency of a monetary amount
///
/// Restricted to the currencies the distributor trades in. Anything else
/// collapses to [`Currency::FALLBACK`] during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Turkish lira
    #[default]
    Try,
    /// US dollar
    Usd,
    /// Euro
    Eur,
    /// Pound sterling
    Gbp,
}

impl Currency {
    /// Currency used when the source value is absent or unrecognized
    pub const FALLBACK: Currency = Currency::Try;

    /// Parses an ISO code or a known alias, case-insensitively
    pub fn from_code(code: &str) -> Option<Currency> {
        match code.trim().to_uppercase().as_str() {
            "TRY" | "TL" | "₺" => Some(Currency::Try),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Try => "TRY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_known() {
        assert_eq!(Currency::from_code("usd"), Some(Currency::Usd));
        assert_eq!(Currency::from_code(" EUR "), Some(Currency::Eur));
        assert_eq!(Currency::from_code("TL"), Some(Currency::Try));
        assert_eq!(Currency::from_code("₺"), Some(Currency::Try));
    }

    #[test]
    fn test_from_code_unknown() {
        assert_eq!(Currency::from_code("JPY"), None);
        assert_eq!(Currency::from_code(""), None);
    }

    #[test]
    fn test_serializes_as_iso_code() {
        assert_eq!(serde_json::to_string(&Currency::Gbp).unwrap(), "\"GBP\"");
        let parsed: Currency = serde_json::from_str("\"TRY\"").unwrap();
        assert_eq!(parsed, Currency::Try);
    }

    #[test]
    fn test_default_is_fallback() {
        assert_eq!(Currency::default(), Currency::FALLBACK);
    }
}
