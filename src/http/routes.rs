use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::get_status))
        // Voice input pause/resume
        .route("/recognition/start", post(handlers::start_recognition))
        .route("/recognition/stop", post(handlers::stop_recognition))
        .layer(TraceLayer::new_for_http())
        // The quiz UI is served from a different origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
