//! Loose accessors over untyped upstream records.
//!
//! The timetable API names the same field several ways and mixes strings,
//! numbers and nulls freely. Aliases are resolved first-match-wins, where a
//! match is any non-empty value: `null`, `false`, `0`, `""`, `[]` and `{}`
//! never win.

use serde_json::{Map, Value};

/// Whether a JSON value counts as present.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// The first non-empty value among `keys`, in key order.
pub fn first_truthy<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| is_truthy(value))
}

/// Render a scalar as text. Compound values and null have no text form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The first non-empty alias, rendered as text.
pub fn first_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_truthy(record, keys).and_then(as_text)
}

/// Coerce to an integer.
///
/// Integers pass through, floats are truncated toward zero and strings are
/// parsed after trimming whitespace. Anything else has no integer form.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Cut `text` to at most `max_chars` characters for log and error context.
pub fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
