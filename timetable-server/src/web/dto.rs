//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::cache::CachedTimetable;
use crate::domain::{GridResult, build_grids};
use crate::upstream::TimetableSummary;

/// Query for the timetable grid.
#[derive(Debug, Default, Deserialize)]
pub struct GridRequest {
    /// Bypass the cache and fetch from upstream
    pub refresh: Option<bool>,
}

/// The timetable grid with fetch metadata.
#[derive(Debug, Serialize)]
pub struct TimetableResponse {
    /// When the document was fetched from upstream (RFC 3339)
    pub fetched_at: String,

    /// Days, periods, grids and lookup maps
    #[serde(flatten)]
    pub grid: GridResult,
}

impl TimetableResponse {
    /// Build grids for a cached document.
    pub fn from_cached(cached: &CachedTimetable) -> Self {
        Self {
            fetched_at: cached.fetched_at.to_rfc3339(),
            grid: build_grids(&cached.document),
        }
    }
}

/// Response for the timetable catalog.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogResponse {
    /// Available timetables, in upstream order
    pub timetables: Vec<TimetableSummary>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
