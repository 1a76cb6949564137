//! Date coercion for ERP exports

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parses a date or timestamp string in any of the accepted formats
///
/// Timestamps without an offset, and plain dates, are taken as UTC. Plain
/// dates resolve to midnight.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(input, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Interprets a JSON value as a timestamp
///
/// Strings go through [`parse_date`]; integers are Unix epoch milliseconds.
pub fn date_from_value(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Coerces a JSON value to a timestamp, falling back to `now`
pub fn coerce_date(value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
    date_from_value(value).unwrap_or(now)
}

/// Coerces an optional date field
///
/// Absent, null and blank values stay `None`; anything else present is
/// coerced like a required date.
pub fn coerce_optional_date(value: Option<&Value>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        present => Some(coerce_date(present, now)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let parsed = parse_date("2024-03-01T12:00:00+03:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_date_only_formats() {
        assert_eq!(parse_date("2024-01-05"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date("05.01.2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date("05/01/2024"), Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn test_naive_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap();
        assert_eq!(parse_date("2024-01-05 14:30:00"), Some(expected));
        assert_eq!(parse_date("2024-01-05T14:30:00"), Some(expected));
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-13-45"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_epoch_millis() {
        let value = json!(1_704_412_800_000i64);
        assert_eq!(date_from_value(Some(&value)), Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn test_coerce_falls_back_to_now() {
        let now = ymd(2030, 6, 1);
        assert_eq!(coerce_date(Some(&json!("garbage")), now), now);
        assert_eq!(coerce_date(None, now), now);
        assert_eq!(coerce_date(Some(&json!({"d": 1})), now), now);
    }

    #[test]
    fn test_coerce_optional() {
        let now = ymd(2030, 6, 1);
        assert_eq!(coerce_optional_date(None, now), None);
        assert_eq!(coerce_optional_date(Some(&json!(null)), now), None);
        assert_eq!(coerce_optional_date(Some(&json!("  ")), now), None);
        assert_eq!(coerce_optional_date(Some(&json!("bogus")), now), Some(now));
        assert_eq!(
            coerce_optional_date(Some(&json!("2024-02-01")), now),
            Some(ymd(2024, 2, 1))
        );
    }
}
