//! # Shared Utility Functions
//!
//! Lenient decoders for the loosely typed fields the server sends, and
//! timestamp parsing for ordering.
//!
//! ## Lenient fields
//!
//! The API is not consistent about id types: the same id may arrive as `17`,
//! `17.0` or `"17"`, and some records carry it under one of several names.
//! The `deserialize_with` helpers below accept all of those forms and map
//! anything unusable to `None` rather than rejecting the whole payload.
//!
//! ```rust
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Row {
//!     #[serde(default, deserialize_with = "shared::utils::lenient_i64")]
//!     id: Option<i64>,
//! }
//!
//! let row: Row = serde_json::from_str(r#"{"id":"42"}"#).unwrap();
//! assert_eq!(row.id, Some(42));
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Decode an optional integer id sent as a number or a numeric string.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumOrString>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        NumOrString::Int(n) => Some(n),
        NumOrString::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        NumOrString::Float(_) => None,
        NumOrString::Text(s) => s.trim().parse().ok(),
    }))
}

/// Decode an optional opaque id (number or string) into its string form.
///
/// Blank strings decode to `None`.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumOrString>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        NumOrString::Int(n) => Some(n.to_string()),
        NumOrString::Float(f) => Some(f.to_string()),
        NumOrString::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }))
}

/// Distinguish a field that is absent from one that is present but `null`.
///
/// Use together with `#[serde(default)]`: absent gives `None`, `null` gives
/// `Some(None)`, a value gives `Some(Some(v))`.
pub fn present_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolForm {
    Bool(bool),
    Int(i64),
    Text(String),
    Other(IgnoredAny),
}

/// Decode an optional flag sent as `true`, `1` or `"true"`.
///
/// Values that are not recognizably true or false decode to `None`.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BoolForm>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        BoolForm::Bool(b) => Some(b),
        BoolForm::Int(0) => Some(false),
        BoolForm::Int(1) => Some(true),
        BoolForm::Int(_) => None,
        BoolForm::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        BoolForm::Other(_) => None,
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampForm {
    Text(String),
    Epoch(i64),
    Parts(Vec<i64>),
    Other(IgnoredAny),
}

/// Decode an optional timestamp into the text form [`parse_timestamp`] reads.
///
/// Besides strings this accepts epoch numbers (seconds or milliseconds) and
/// the `[year, month, day, hour, minute, second, nanos]` arrays a Java
/// backend emits for `LocalDateTime`. Anything else decodes to `None`.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<TimestampForm>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        TimestampForm::Text(s) => Some(s),
        TimestampForm::Epoch(n) => {
            let dt = if n.unsigned_abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(n)
            } else {
                DateTime::from_timestamp(n, 0)
            };
            dt.map(|dt| dt.to_rfc3339())
        }
        TimestampForm::Parts(parts) => timestamp_from_parts(&parts),
        TimestampForm::Other(_) => None,
    }))
}

fn timestamp_from_parts(parts: &[i64]) -> Option<String> {
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    if parts.len() < 3 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(part(0)).ok()?,
        u32::try_from(part(1)).ok()?,
        u32::try_from(part(2)).ok()?,
    )?;
    let naive = date.and_hms_nano_opt(
        u32::try_from(part(3)).ok()?,
        u32::try_from(part(4)).ok()?,
        u32::try_from(part(5)).ok()?,
        u32::try_from(part(6)).ok()?,
    )?;
    Some(naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 (`2025-05-03T18:21:04Z`) as well as the zone-less
/// `LocalDateTime` form (`2025-05-03T18:21:04.311`), which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_i64")]
        num: Option<i64>,
        #[serde(default, deserialize_with = "lenient_id")]
        id: Option<String>,
        #[serde(default, deserialize_with = "present_nullable")]
        read_at: Option<Option<String>>,
        #[serde(default, deserialize_with = "lenient_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "lenient_timestamp")]
        at: Option<String>,
    }

    #[test]
    fn test_lenient_i64_forms() {
        let p: Sample = serde_json::from_str(r#"{"num": 7}"#).unwrap();
        assert_eq!(p.num, Some(7));
        let p: Sample = serde_json::from_str(r#"{"num": "8"}"#).unwrap();
        assert_eq!(p.num, Some(8));
        let p: Sample = serde_json::from_str(r#"{"num": 9.0}"#).unwrap();
        assert_eq!(p.num, Some(9));
        let p: Sample = serde_json::from_str(r#"{"num": "abc"}"#).unwrap();
        assert_eq!(p.num, None);
        let p: Sample = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.num, None);
    }

    #[test]
    fn test_lenient_id_forms() {
        let p: Sample = serde_json::from_str(r#"{"id": 17}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("17"));
        let p: Sample = serde_json::from_str(r#"{"id": "n1"}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("n1"));
        let p: Sample = serde_json::from_str(r#"{"id": "  "}"#).unwrap();
        assert_eq!(p.id, None);
    }

    #[test]
    fn test_present_nullable() {
        let p: Sample = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.read_at, None);
        let p: Sample = serde_json::from_str(r#"{"read_at": null}"#).unwrap();
        assert_eq!(p.read_at, Some(None));
        let p: Sample = serde_json::from_str(r#"{"read_at": "2025-01-01T00:00:00"}"#).unwrap();
        assert_eq!(p.read_at, Some(Some("2025-01-01T00:00:00".to_string())));
    }

    #[test]
    fn test_lenient_bool_forms() {
        let p: Sample = serde_json::from_str(r#"{"flag": true}"#).unwrap();
        assert_eq!(p.flag, Some(true));
        let p: Sample = serde_json::from_str(r#"{"flag": 0}"#).unwrap();
        assert_eq!(p.flag, Some(false));
        let p: Sample = serde_json::from_str(r#"{"flag": "TRUE"}"#).unwrap();
        assert_eq!(p.flag, Some(true));
        let p: Sample = serde_json::from_str(r#"{"flag": {"x": 1}}"#).unwrap();
        assert_eq!(p.flag, None);
    }

    #[test]
    fn test_lenient_timestamp_forms() {
        let p: Sample = serde_json::from_str(r#"{"at": [2025, 5, 3, 18, 21, 4]}"#).unwrap();
        let from_parts = p.at.as_deref().and_then(parse_timestamp).unwrap();
        assert_eq!(from_parts, parse_timestamp("2025-05-03T18:21:04Z").unwrap());

        let p: Sample = serde_json::from_str(r#"{"at": 1746296464000}"#).unwrap();
        assert_eq!(p.at.as_deref().and_then(parse_timestamp), Some(from_parts));

        let p: Sample = serde_json::from_str(r#"{"at": 1746296464}"#).unwrap();
        assert_eq!(p.at.as_deref().and_then(parse_timestamp), Some(from_parts));

        let p: Sample = serde_json::from_str(r#"{"at": [2025, 13, 40]}"#).unwrap();
        assert_eq!(p.at, None);
        let p: Sample = serde_json::from_str(r#"{"at": true}"#).unwrap();
        assert_eq!(p.at, None);
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2025-05-03T18:21:04Z").is_some());
        assert!(parse_timestamp("2025-05-03T18:21:04.311").is_some());
        assert!(parse_timestamp("2025-05-03 18:21:04").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());

        let earlier = parse_timestamp("2025-05-03T18:21:04").unwrap();
        let later = parse_timestamp("2025-05-03T18:21:05+00:00").unwrap();
        assert!(earlier < later);
    }
}
