use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
///
/// When `static_dir` is set, unmatched paths are served from it.
pub fn create_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview lifecycle
        .route("/api/start", post(handlers::start_interview))
        .route("/api/state", get(handlers::get_state))
        // Recording control
        .route("/api/record", post(handlers::start_recording))
        .route("/api/stop_recording", post(handlers::stop_recording))
        .route("/api/reset_recording", post(handlers::reset_recording))
        // Backend status
        .route("/api/voice_status", get(handlers::voice_status))
        .route("/api/check_voice", get(handlers::check_voice));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
