//! Timetable API client.
//!
//! This module talks to the third-party timetable API, whose response
//! envelopes vary across deployments.
//!
//! Key characteristics of the API:
//! - `GET /timetables` lists timetables; `GET /timetables/{id}` returns one
//! - Both may wrap their payload in `{success, data}` or `{timetables}`
//!   envelopes, or return it bare
//! - Authentication is a bearer token

mod client;
mod envelope;
mod error;
mod types;

pub use client::{DEFAULT_BASE_URL, TimetableClient, TimetableConfig, TimetableSource};
pub use envelope::{extract_payload, normalize_listing, select_timetable, timetable_id};
pub use error::FetchError;
pub use types::TimetableSummary;
