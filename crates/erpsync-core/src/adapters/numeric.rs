//! Tolerant numeric parsing for ERP exports
//!
//! ERP exports mix Turkish (`1.234,56`) and English (`1,234.56`) number
//! formatting, currency symbols and stray whitespace. The rules:
//!
//! 1. JSON numbers are taken as-is when finite.
//! 2. When both `,` and `.` occur, the one occurring last is the decimal
//!    separator and the other a thousands separator. A single `,` alone is a
//!    decimal separator; repeated `,` or repeated `.` are thousands separators.
//! 3. Everything except digits, `.` and `-` is dropped.
//! 4. Whatever remains must parse as a finite `f64`, otherwise `None`.

use serde_json::Value;

/// Extracts a number from a loosely-typed JSON value
///
/// Returns `None` for null, booleans, arrays, objects and strings that hold
/// no valid number. Never returns NaN or infinity.
pub fn parse_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_number_str(s),
        _ => None,
    }
}

/// Extracts a number from free-form text
pub fn parse_number_str(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = normalize_separators(trimmed);
    let cleaned: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Rewrites the input so that `.` is the only decimal separator
fn normalize_separators(input: &str) -> String {
    let last_comma = input.rfind(',');
    let last_dot = input.rfind('.');

    match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma > dot => input.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => input.replace(',', ""),
        (Some(_), None) if input.matches(',').count() == 1 => input.replace(',', "."),
        (Some(_), None) => input.replace(',', ""),
        (None, Some(_)) if input.matches('.').count() > 1 => input.replace('.', ""),
        _ => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_turkish_format() {
        assert_eq!(parse_number_str("1.234,56"), Some(1234.56));
        assert_eq!(parse_number_str("12,5"), Some(12.5));
        assert_eq!(parse_number_str("1.234.567"), Some(1234567.0));
    }

    #[test]
    fn test_english_format() {
        assert_eq!(parse_number_str("1,234.56"), Some(1234.56));
        assert_eq!(parse_number_str("1,234,567"), Some(1234567.0));
        assert_eq!(parse_number_str("0.75"), Some(0.75));
    }

    #[test]
    fn test_symbols_and_whitespace_are_stripped() {
        assert_eq!(parse_number_str("₺ 150"), Some(150.0));
        assert_eq!(parse_number_str("  -42,00 TL "), Some(-42.0));
        assert_eq!(parse_number_str("$1,099.90"), Some(1099.9));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_number_str("abc"), None);
        assert_eq!(parse_number_str(""), None);
        assert_eq!(parse_number_str("   "), None);
        assert_eq!(parse_number_str("-"), None);
        assert_eq!(parse_number_str("1-2"), None);
        assert_eq!(parse_number_str("."), None);
    }

    #[test]
    fn test_json_values() {
        assert_eq!(parse_number(Some(&json!(140))), Some(140.0));
        assert_eq!(parse_number(Some(&json!(12.25))), Some(12.25));
        assert_eq!(parse_number(Some(&json!("1.234,56"))), Some(1234.56));
        assert_eq!(parse_number(Some(&json!(null))), None);
        assert_eq!(parse_number(Some(&json!(true))), None);
        assert_eq!(parse_number(Some(&json!([1]))), None);
        assert_eq!(parse_number(None), None);
    }

    #[test]
    fn test_never_zero_for_invalid() {
        assert_ne!(parse_number_str("abc"), Some(0.0));
    }
}
