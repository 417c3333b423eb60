//! Health Check API Handler
//!
//! Liveness probe for deployments and the CLI.

use axum::{http::StatusCode, response::IntoResponse};

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
