//! Web layer for the timetable service.
//!
//! Exposes the grid structure and the timetable catalog as JSON for the
//! rendering front end. Authentication and HTML are handled elsewhere.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, FETCH_FAILED_MESSAGE, create_router};
pub use state::AppState;
