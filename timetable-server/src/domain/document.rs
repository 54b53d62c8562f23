//! Timetable document model.
//!
//! A `TimetableDocument` is parsed once from the payload the upstream API
//! returns. Every field is optional upstream and several have aliases, so
//! parsing never fails on a mapping: missing pieces become `None` or empty
//! collections and unusable records are skipped.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::fields::{as_int, as_text, first_text, first_truthy, is_truthy};

/// A subject, teacher or class record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    /// Lookup key: the record's id, or its name when it has no id.
    pub key: String,
    pub name: Option<String>,
    pub color: Option<String>,
    /// The record as received.
    pub raw: Value,
}

impl Entity {
    /// Parse a record. Returns `None` when it has neither an id nor a name,
    /// since such a record can never be referenced.
    pub fn from_record(record: &Map<String, Value>) -> Option<Self> {
        let key = first_text(record, &["id", "_id"])
            .or_else(|| first_text(record, &["name", "title"]))?;

        Some(Self {
            key,
            name: first_text(record, &["name", "title"]),
            color: record
                .get("color")
                .and_then(as_text)
                .filter(|c| !c.is_empty()),
            raw: Value::Object(record.clone()),
        })
    }
}

/// One period definition from `generalSettings.periods`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodDefinition {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub name: Option<String>,
}

impl PeriodDefinition {
    fn from_value(value: &Value) -> Self {
        let Some(record) = value.as_object() else {
            return Self::default();
        };

        Self {
            start_time: first_text(record, &["start_time", "startTime", "start"]),
            end_time: first_text(record, &["end_time", "endTime", "end"]),
            name: first_text(record, &["name", "label"]),
        }
    }
}

/// The `generalSettings` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralSettings {
    /// Configured day names, if the document lists any.
    pub day_names: Option<Vec<String>>,
    /// Period definitions in upstream order.
    pub periods: Vec<PeriodDefinition>,
    /// Explicit periods-per-day count, when it parses as an integer.
    pub periods_per_day: Option<i64>,
    pub timetable_name: Option<String>,
}

impl GeneralSettings {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(record) = value.and_then(Value::as_object) else {
            return Self::default();
        };

        let day_names = first_truthy(record, &["dayNames", "days"])
            .and_then(Value::as_array)
            .map(|days| {
                days.iter()
                    .map(|d| as_text(d).unwrap_or_else(|| d.to_string()))
                    .collect()
            });

        let periods = record
            .get("periods")
            .and_then(Value::as_array)
            .map(|periods| periods.iter().map(PeriodDefinition::from_value).collect())
            .unwrap_or_default();

        Self {
            day_names,
            periods,
            periods_per_day: first_truthy(record, &["periodsPerDay", "periods_per_day"])
                .and_then(as_int),
            timetable_name: first_text(record, &["timetableName"]),
        }
    }
}

/// One placement from the `schedule` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    /// Day name as given upstream; resolved against the day list later.
    pub day: Option<String>,
    /// Zero-based period index; 0 when missing or unparsable.
    pub period: i64,
    pub subject_id: Option<String>,
    pub teacher_id: Option<String>,
    pub class_id: Option<String>,
    /// Length in periods.
    pub duration: u32,
    /// The record as received, kept for diagnostics.
    pub raw: Value,
}

impl ScheduleEntry {
    pub fn from_record(record: &Map<String, Value>) -> Self {
        // An explicit `period_index` of 0 is meaningful, so it is checked for
        // presence rather than truthiness.
        let period = match record.get("period_index") {
            Some(v) if !v.is_null() => Some(v),
            _ => first_truthy(record, &["period", "periodIndex", "index"]),
        };

        Self {
            day: first_text(record, &["day", "dayName", "day_name"]),
            period: period.and_then(as_int).unwrap_or(0),
            subject_id: reference(record, "subjectIds", "subjectId"),
            teacher_id: reference(record, "teacherIds", "teacherId"),
            class_id: reference(record, "classIds", "classId"),
            duration: record
                .get("length")
                .or_else(|| record.get("duration"))
                .and_then(as_int)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(1),
            raw: Value::Object(record.clone()),
        }
    }
}

/// Resolve an entity reference: the first id of a non-empty plural field,
/// otherwise the singular field.
fn reference(record: &Map<String, Value>, plural: &str, singular: &str) -> Option<String> {
    match record.get(plural).filter(|v| is_truthy(v)) {
        Some(Value::Array(ids)) => ids.first().and_then(as_text),
        Some(other) => as_text(other),
        None => record
            .get(singular)
            .filter(|v| is_truthy(v))
            .and_then(as_text),
    }
}

/// A fetched timetable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimetableDocument {
    pub id: Option<String>,
    pub name: Option<String>,
    pub settings: GeneralSettings,
    pub subjects: Vec<Entity>,
    pub teachers: Vec<Entity>,
    pub classes: Vec<Entity>,
    pub schedule: Vec<Arc<ScheduleEntry>>,
}

impl TimetableDocument {
    /// Parse a document. Returns `None` unless `value` is a mapping.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_record)
    }

    pub fn from_record(record: &Map<String, Value>) -> Self {
        let settings = GeneralSettings::from_value(record.get("generalSettings"));

        let name = first_text(record, &["name"])
            .or_else(|| settings.timetable_name.clone())
            .or_else(|| first_text(record, &["title"]));

        let schedule = record
            .get("schedule")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|entry| Arc::new(ScheduleEntry::from_record(entry)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: first_text(record, &["_id", "id"]),
            name,
            subjects: entities(record, &["subjects", "lessons"]),
            teachers: entities(record, &["teachers"]),
            classes: entities(record, &["classes"]),
            settings,
            schedule,
        }
    }
}

fn entities(record: &Map<String, Value>, keys: &[&str]) -> Vec<Entity> {
    first_truthy(record, keys)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(Entity::from_record)
                .collect()
        })
        .unwrap_or_default()
}
