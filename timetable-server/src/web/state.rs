//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedTimetableClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Cached timetable API client
    pub timetables: Arc<CachedTimetableClient>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(timetables: CachedTimetableClient) -> Self {
        Self {
            timetables: Arc::new(timetables),
        }
    }
}
