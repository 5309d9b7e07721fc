use axum::{
    routing::{get, post},
    Router,
};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState, max_concurrent_requests: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Fire-and-forget interaction events
        .route("/events/viewed", post(handlers::viewed))
        .route("/events/completed", post(handlers::completed))
        .route("/events/answered", post(handlers::answered))
        .route("/events/mood", post(handlers::mood))
        // Recommendations
        .route("/recommendations/:user_id", get(handlers::recommendations))
}
