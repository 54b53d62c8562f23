//! Envelope rules for upstream responses.
//!
//! Deployments of the timetable API wrap their payloads differently:
//! `{success, data: {...}}`, `{data: [...]}`, `{timetables: [...]}`, or the
//! bare document. All shape probing for envelopes happens here so the client
//! and the domain layer only ever see the unwrapped payload.

use serde_json::{Map, Value};

use crate::domain::fields::{first_text, is_truthy};

use super::types::TimetableSummary;

/// Keys whose presence marks a mapping as a timetable document.
const TIMETABLE_KEYS: [&str; 6] = [
    "_id",
    "generalSettings",
    "schedule",
    "subjects",
    "classes",
    "teachers",
];

/// Keys whose presence marks a mapping as a single listing entry.
const SUMMARY_KEYS: [&str; 5] = ["id", "_id", "name", "title", "timetableName"];

/// Aliases for a listing entry's identifier, in precedence order.
const ID_KEYS: [&str; 4] = ["id", "_id", "tid", "timetableId"];

fn looks_like_timetable(record: &Map<String, Value>) -> bool {
    TIMETABLE_KEYS.iter().any(|k| record.contains_key(*k))
}

/// Locate the useful payload in a single-timetable response.
///
/// Rules, first match wins:
/// 1. `null` → `None`.
/// 2. A mapping with a timetable key is the payload itself.
/// 3. A non-empty `data` field is the payload.
/// 4. A non-empty `timetables` field is the payload.
/// 5. Anything else passes through unchanged.
pub fn extract_payload(value: &Value) -> Option<&Value> {
    let record = match value {
        Value::Null => return None,
        Value::Object(record) => record,
        other => return Some(other),
    };

    if looks_like_timetable(record) {
        return Some(value);
    }

    // A timetable-shaped `data` and any other non-empty `data` are both
    // returned verbatim; the caller decides whether it is usable.
    if let Some(data) = record.get("data").filter(|d| is_truthy(d)) {
        return Some(data);
    }

    if let Some(timetables) = record.get("timetables").filter(|t| is_truthy(t)) {
        return Some(timetables);
    }

    Some(value)
}

/// Turn a listing response into its entries, in upstream order.
pub fn normalize_listing(listing: &Value) -> Vec<Value> {
    if !is_truthy(listing) {
        return Vec::new();
    }

    match listing {
        Value::Array(items) => items.clone(),
        Value::Object(record) => normalize_listing_envelope(record),
        _ => Vec::new(),
    }
}

fn normalize_listing_envelope(record: &Map<String, Value>) -> Vec<Value> {
    match record.get("data") {
        Some(Value::Object(data)) if data.contains_key("timetables") => {
            return match data.get("timetables") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
        }
        Some(Value::Array(items)) => return items.clone(),
        _ => {}
    }

    if let Some(Value::Array(items)) = record.get("timetables") {
        return items.clone();
    }

    if SUMMARY_KEYS.iter().any(|k| record.contains_key(*k)) {
        return vec![Value::Object(record.clone())];
    }

    Vec::new()
}

/// Pick the entry to fetch: the first published one, else the first one.
pub fn select_timetable(entries: &[Value]) -> Option<&Value> {
    entries
        .iter()
        .find(|entry| TimetableSummary::from_value(entry).is_published())
        .or_else(|| entries.first())
}

/// Identifier of a listing entry, from any of its id aliases.
pub fn timetable_id(entry: &Value) -> Option<String> {
    entry
        .as_object()
        .and_then(|record| first_text(record, &ID_KEYS))
}
