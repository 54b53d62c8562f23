//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::upstream::FetchError;

use super::dto::*;
use super::state::AppState;

/// Shown to users when no timetable could be fetched.
pub const FETCH_FAILED_MESSAGE: &str =
    "could not fetch timetable from API. Check API_KEY and connectivity.";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/timetable", get(timetable))
        .route("/api/timetables", get(catalog))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Current timetable as grids.
async fn timetable(
    State(state): State<AppState>,
    Query(req): Query<GridRequest>,
) -> Result<Json<TimetableResponse>, AppError> {
    let cached = state
        .timetables
        .fetch_timetable_data(req.refresh.unwrap_or(false))
        .await?;

    Ok(Json(TimetableResponse::from_cached(&cached)))
}

/// Timetable catalog.
async fn catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let timetables = state.timetables.list_available_timetables().await;
    Json(CatalogResponse { timetables })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Upstream could not supply a timetable.
    Upstream { message: String },
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        // The cause is already logged at the client boundary.
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let AppError::Upstream { message } = self;
        warn!(cause = %message, "responding 502");

        let body = Json(ErrorResponse {
            error: FETCH_FAILED_MESSAGE.to_string(),
        });
        (StatusCode::BAD_GATEWAY, body).into_response()
    }
}
