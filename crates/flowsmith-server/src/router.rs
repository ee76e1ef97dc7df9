//! Router assembly for the flowchart API.

use axum::Router;
use axum::routing::{get, post};
use flowsmith_llm::ChatBackend;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the axum router with all API routes.
///
/// CORS is permissive: the editor front-end may be served from any origin.
pub fn build_router<B: ChatBackend + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/api/generate-flow", post(handlers::generate_flow::<B>))
        .route("/api/health", get(handlers::health::<B>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
