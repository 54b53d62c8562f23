//! Day × period grids built from a timetable document.
//!
//! `build_grids` is a pure function: it resolves the day and period axes,
//! indexes subjects, teachers and classes by key, then walks the schedule in
//! input order placing a resolved `GridSlot` into one grid per class and one
//! per teacher. Malformed entries never fail the build; unknown references
//! render as `"-"` and out-of-range placements are dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::trace;

use super::document::{Entity, PeriodDefinition, ScheduleEntry, TimetableDocument};

/// Days used when the document does not configure any.
pub const DEFAULT_DAYS: [&str; 6] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Display name for an unresolved subject, teacher or class.
pub const UNRESOLVED: &str = "-";

/// Largest explicit period count accepted from a document. Larger counts are
/// treated like a missing one.
pub const MAX_PERIODS_PER_DAY: usize = 64;

/// A period column header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub index: usize,
    pub start_time: String,
    pub end_time: String,
    pub name: String,
}

impl Period {
    fn resolve(index: usize, definition: Option<&PeriodDefinition>) -> Self {
        let definition = definition.cloned().unwrap_or_default();
        Self {
            index,
            start_time: definition.start_time.unwrap_or_default(),
            end_time: definition.end_time.unwrap_or_default(),
            name: definition
                .name
                .unwrap_or_else(|| format!("Period {}", index + 1)),
        }
    }
}

/// A resolved, display-ready placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSlot {
    pub subject: String,
    pub subject_color: Option<String>,
    pub teacher: String,
    pub teacher_color: Option<String>,
    #[serde(rename = "class")]
    pub class_name: String,
    pub class_color: Option<String>,
    /// Length in periods.
    pub length: u32,
    /// The schedule entry this slot was resolved from.
    #[serde(rename = "raw", serialize_with = "serialize_entry")]
    pub entry: Arc<ScheduleEntry>,
}

fn serialize_entry<S: Serializer>(entry: &Arc<ScheduleEntry>, s: S) -> Result<S::Ok, S::Error> {
    entry.raw.serialize(s)
}

/// A `[day][period]` matrix of slots. Cells may hold several slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Grid {
    cells: Vec<Vec<Vec<GridSlot>>>,
}

impl Grid {
    /// Allocate an empty `days × periods` grid.
    pub fn new(days: usize, periods: usize) -> Self {
        Self {
            cells: vec![vec![Vec::new(); periods]; days],
        }
    }

    /// Rows, one per day.
    pub fn rows(&self) -> &[Vec<Vec<GridSlot>>] {
        &self.cells
    }

    /// Slots at a cell, or `None` if the cell is out of range.
    pub fn cell(&self, day: usize, period: usize) -> Option<&[GridSlot]> {
        self.cells
            .get(day)
            .and_then(|row| row.get(period))
            .map(Vec::as_slice)
    }

    /// Total number of placed slots.
    pub fn slot_count(&self) -> usize {
        self.cells.iter().flatten().map(Vec::len).sum()
    }

    fn place(&mut self, day: usize, period: usize, slot: GridSlot) {
        if let Some(cell) = self.cells.get_mut(day).and_then(|row| row.get_mut(period)) {
            cell.push(slot);
        }
    }
}

/// Name and identifier of the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimetableMeta {
    pub name: Option<String>,
    pub id: Option<String>,
}

/// Everything the renderer needs to draw the timetable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridResult {
    pub days: Vec<String>,
    pub periods: Vec<Period>,
    pub classes_grid: BTreeMap<String, Grid>,
    pub teachers_grid: BTreeMap<String, Grid>,
    pub subjects_map: BTreeMap<String, Entity>,
    pub meta: TimetableMeta,
}

impl GridResult {
    /// Number of period columns in every grid.
    pub fn periods_per_day(&self) -> usize {
        self.periods.len()
    }
}

/// Build grids from an untyped payload. Anything but a mapping yields an
/// empty result.
pub fn build_from_value(value: Option<&Value>) -> GridResult {
    value
        .and_then(TimetableDocument::from_value)
        .map(|doc| build_grids(&doc))
        .unwrap_or_default()
}

/// Build the day list, period list, lookup maps and per-class/per-teacher
/// grids for a document.
pub fn build_grids(doc: &TimetableDocument) -> GridResult {
    let days = resolve_days(doc);
    let periods_per_day = resolve_periods_per_day(doc);
    let periods = (0..periods_per_day)
        .map(|i| Period::resolve(i, doc.settings.periods.get(i)))
        .collect();

    let subjects = index_by_key(&doc.subjects);
    let teachers = index_by_key(&doc.teachers);
    let classes = index_by_key(&doc.classes);

    let mut classes_grid: BTreeMap<String, Grid> = BTreeMap::new();
    let mut teachers_grid: BTreeMap<String, Grid> = BTreeMap::new();

    for entry in &doc.schedule {
        let day = resolve_day(&days, entry.day.as_deref());
        let period = usize::try_from(entry.period)
            .ok()
            .filter(|p| *p < periods_per_day);

        let (subject, subject_color) = resolve_entity(&subjects, entry.subject_id.as_deref());
        let (teacher, teacher_color) = resolve_entity(&teachers, entry.teacher_id.as_deref());
        let (class_name, class_color) = resolve_entity(&classes, entry.class_id.as_deref());

        let class_grid = classes_grid
            .entry(class_name.clone())
            .or_insert_with(|| Grid::new(days.len(), periods_per_day));
        let teacher_grid = teachers_grid
            .entry(teacher.clone())
            .or_insert_with(|| Grid::new(days.len(), periods_per_day));

        let slot = GridSlot {
            subject,
            subject_color,
            teacher,
            teacher_color,
            class_name,
            class_color,
            length: entry.duration,
            entry: Arc::clone(entry),
        };

        match period {
            Some(period) if day < days.len() => {
                class_grid.place(day, period, slot.clone());
                teacher_grid.place(day, period, slot);
            }
            _ => trace!(
                day,
                period = entry.period,
                periods_per_day,
                "dropping out-of-range schedule entry"
            ),
        }
    }

    GridResult {
        days,
        periods,
        classes_grid,
        teachers_grid,
        subjects_map: subjects
            .into_iter()
            .map(|(key, entity)| (key.to_string(), entity.clone()))
            .collect(),
        meta: TimetableMeta {
            name: doc.name.clone(),
            id: doc.id.clone(),
        },
    }
}

fn resolve_days(doc: &TimetableDocument) -> Vec<String> {
    match &doc.settings.day_names {
        Some(days) if !days.is_empty() => days.clone(),
        _ => DEFAULT_DAYS.iter().map(|d| d.to_string()).collect(),
    }
}

/// The explicit count when it is positive and at most `MAX_PERIODS_PER_DAY`,
/// otherwise the number of period definitions.
fn resolve_periods_per_day(doc: &TimetableDocument) -> usize {
    let fallback = doc.settings.periods.len();
    let Some(explicit) = doc.settings.periods_per_day.filter(|n| *n > 0) else {
        return fallback;
    };

    match usize::try_from(explicit) {
        Ok(n) if n <= MAX_PERIODS_PER_DAY => n,
        _ => {
            trace!(
                explicit,
                max = MAX_PERIODS_PER_DAY,
                fallback,
                "ignoring oversized periodsPerDay"
            );
            fallback
        }
    }
}

/// Exact match first, then a case-insensitive match on the first three
/// characters, then the first day.
fn resolve_day(days: &[String], name: Option<&str>) -> usize {
    let Some(name) = name else {
        return 0;
    };

    if let Some(index) = days.iter().position(|d| d == name) {
        return index;
    }

    let prefix: String = name.to_lowercase().chars().take(3).collect();
    days.iter()
        .position(|d| d.to_lowercase().starts_with(&prefix))
        .unwrap_or(0)
}

fn index_by_key(entities: &[Entity]) -> BTreeMap<&str, &Entity> {
    entities.iter().map(|e| (e.key.as_str(), e)).collect()
}

fn resolve_entity(
    index: &BTreeMap<&str, &Entity>,
    id: Option<&str>,
) -> (String, Option<String>) {
    match id.and_then(|id| index.get(id)) {
        Some(entity) => (
            entity
                .name
                .clone()
                .unwrap_or_else(|| UNRESOLVED.to_string()),
            entity.color.clone(),
        ),
        None => (UNRESOLVED.to_string(), None),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const DAY_POOL: [&str; 8] = [
        "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday", "Funday",
    ];

    fn arb_entry() -> impl Strategy<Value = Value> {
        (
            prop::option::of(prop::sample::select(DAY_POOL.to_vec())),
            -3i64..15,
            prop::option::of(0u8..4),
            prop::option::of(0u8..4),
        )
            .prop_map(|(day, period, class, teacher)| {
                json!({
                    "day": day,
                    "period_index": period,
                    "classId": class.map(|c| format!("c{c}")),
                    "teacherId": teacher.map(|t| format!("t{t}")),
                })
            })
    }

    fn arb_document() -> impl Strategy<Value = (Value, usize, Option<i64>)> {
        (
            0usize..8,
            prop::option::of(prop_oneof![
                4 => -2i64..10,
                1 => 60i64..70,
                1 => Just(i64::MAX),
            ]),
            0usize..10,
            prop::collection::vec(arb_entry(), 0..20),
        )
            .prop_map(|(day_count, explicit, raw_periods, schedule)| {
                let day_names: Vec<&str> = DAY_POOL.iter().take(day_count).copied().collect();
                let periods: Vec<Value> = (0..raw_periods)
                    .map(|i| json!({"name": format!("P{i}")}))
                    .collect();
                let doc = json!({
                    "generalSettings": {
                        "dayNames": day_names,
                        "periodsPerDay": explicit,
                        "periods": periods,
                    },
                    "classes": [{"id": "c0", "name": "Zero"}, {"id": "c1", "name": "One"}],
                    "teachers": [{"id": "t0", "name": "Tee"}],
                    "schedule": schedule,
                });
                (doc, raw_periods, explicit)
            })
    }

    proptest! {
        #[test]
        fn grid_dimensions_match_axes((doc, raw_periods, explicit) in arb_document()) {
            let result = build_from_value(Some(&doc));

            let expected_periods = match explicit {
                Some(n) if n > 0 && n as usize <= MAX_PERIODS_PER_DAY => n as usize,
                _ => raw_periods,
            };

            prop_assert!(!result.days.is_empty());
            prop_assert_eq!(result.periods_per_day(), expected_periods);

            for grid in result.classes_grid.values().chain(result.teachers_grid.values()) {
                prop_assert_eq!(grid.rows().len(), result.days.len());
                for row in grid.rows() {
                    prop_assert_eq!(row.len(), expected_periods);
                }
            }
        }

        #[test]
        fn build_is_idempotent((doc, _, _) in arb_document()) {
            let first = build_from_value(Some(&doc));
            let second = build_from_value(Some(&doc));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn every_in_range_entry_is_placed_once_per_grid_kind((doc, _, _) in arb_document()) {
            let result = build_from_value(Some(&doc));
            let class_slots: usize = result.classes_grid.values().map(Grid::slot_count).sum();
            let teacher_slots: usize = result.teachers_grid.values().map(Grid::slot_count).sum();
            prop_assert_eq!(class_slots, teacher_slots);
        }
    }
}
