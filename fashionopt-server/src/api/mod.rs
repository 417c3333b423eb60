//! API Module
//!
//! HTTP API layer of the pricing server.

pub mod error;
pub mod health;
pub mod simulation;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Simulation endpoints
        .route("/api/simulate", post(simulation::submit_simulation))
        .route("/api/simulate/status/{id}", get(simulation::get_status))
        .route(
            "/api/simulate/cleanup/{id}",
            post(simulation::cleanup_simulation),
        )
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
