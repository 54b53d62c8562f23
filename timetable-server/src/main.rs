use timetable_server::cache::CachedTimetableClient;
use timetable_server::config::AppConfig;
use timetable_server::upstream::TimetableClient;
use timetable_server::web::{AppState, create_router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,timetable_server=debug")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    if config.api_key.is_none() {
        warn!("TIMETABLE_API_KEY not set. Timetable requests will fail.");
    }

    // Create timetable client
    let client =
        TimetableClient::new(config.timetable_config()).expect("Failed to create timetable client");

    // Create cached client
    let cached = CachedTimetableClient::new(client, &config.cache_config());
    let cache_ttl_secs = cached.ttl().as_secs();

    // Build app state and router
    let app = create_router(AppState::new(cached));

    let addr = config.bind_addr;
    info!(
        %addr,
        base_url = %config.base_url,
        timetable_id = config.timetable_id.as_deref().unwrap_or("(first published)"),
        cache_ttl_secs,
        "timetable service listening"
    );
    info!("GET /health          - Health check");
    info!("GET /api/timetable   - Timetable grids (?refresh=true to bypass cache)");
    info!("GET /api/timetables  - Timetable catalog");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
