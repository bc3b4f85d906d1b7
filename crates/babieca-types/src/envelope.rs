//! Defensive unwrapping of the backend's `data` / `attributes` envelope.
//!
//! The backend answers either `{ "data": ... }` or a bare payload, and each
//! record may keep its fields under `attributes`. Field lookups follow
//! JavaScript truthiness: empty strings, zero and `null` fall through to the
//! next candidate key.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Returns `body.data` when present and non-null, else `body`.
pub fn unwrap_data(body: &Value) -> &Value {
    match body.get("data") {
        Some(data) if !data.is_null() => data,
        _ => body,
    }
}

/// Returns the records of a list response. Non-array payloads yield nothing.
pub fn unwrap_list(body: &Value) -> &[Value] {
    unwrap_data(body)
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Returns `record.attributes` when it is an object, else `record`.
pub fn attributes(record: &Value) -> &Value {
    match record.get("attributes") {
        Some(attrs) if attrs.is_object() => attrs,
        _ => record,
    }
}

/// Resolves a relation value into an identifier string.
///
/// Accepts numbers, non-empty strings, `{ "id": .. }` objects and
/// `{ "data": { "id": .. } }` relation wrappers.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            if let Some(data) = map.get("data")
                && !data.is_null()
            {
                return id_string(data);
            }
            map.get("id").and_then(id_string)
        }
        _ => None,
    }
}

/// First non-empty string among `keys`.
pub fn first_str<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// First non-zero number among `keys`. Numeric strings are accepted.
pub fn first_number(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(as_number))
        .find(|n| *n != 0.0)
}

/// First boolean among `keys`, regardless of its value.
pub fn first_bool(obj: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| obj.get(*key).and_then(Value::as_bool))
}

/// First identifier among `keys` (see [`id_string`]).
pub fn first_id(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(id_string)
}

/// First parseable RFC 3339 timestamp among `keys`.
pub fn first_timestamp(obj: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find_map(parse_timestamp)
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date at midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
