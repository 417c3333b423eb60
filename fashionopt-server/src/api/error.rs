//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::simulation_service::SimulationJobError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<SimulationJobError> for ApiError {
    fn from(err: SimulationJobError) -> Self {
        match err {
            SimulationJobError::NotFound(id) => {
                ApiError::NotFound(format!("Simulation {} not found", id))
            }
            SimulationJobError::MissingFile => {
                ApiError::BadRequest("A product file is required.".to_string())
            }
            SimulationJobError::Storage(err) => {
                ApiError::InternalError(format!("Error starting simulation: {}", err))
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
