//! Timetable domain model and grid construction.
//!
//! Documents are parsed tolerantly from whatever the upstream API returns;
//! grids are derived from them by a pure builder with no I/O.

mod document;
pub(crate) mod fields;
mod grid;

pub use document::{Entity, GeneralSettings, PeriodDefinition, ScheduleEntry, TimetableDocument};
pub use grid::{
    DEFAULT_DAYS, Grid, GridResult, GridSlot, Period, TimetableMeta, UNRESOLVED, build_from_value,
    build_grids,
};
