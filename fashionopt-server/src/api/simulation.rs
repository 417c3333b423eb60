//! Simulation API Handlers
//!
//! HTTP endpoints the coordinator talks to: submit, poll, clean up.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use fashionopt_core::domain::simulation::{SimulationId, SimulationStatus};

use crate::api::error::{ApiError, ApiResult};
use crate::service::simulation_service::{self, SimulationUpload};
use crate::state::AppState;

/// Multipart part carrying the product file
pub const FILE_FIELD: &str = "file";

/// POST /api/simulate
/// Start a simulation; responds with the plain-text job ID
pub async fn submit_simulation(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<String> {
    let upload = read_upload(multipart).await?;
    tracing::info!(
        "Simulation submitted (file: {:?}, {} fields)",
        upload.file_name,
        upload.fields.len()
    );

    let id = simulation_service::launch_simulation(&state, upload).await?;
    Ok(id.to_string())
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<SimulationUpload> {
    let mut upload = SimulationUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_FIELD {
            upload.file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
            upload.file = Some(bytes.to_vec());
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read field '{}': {}", name, e)))?;
            upload.fields.insert(name, value);
        }
    }

    Ok(upload)
}

/// GET /api/simulate/status/{id}
/// Current status of a simulation
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SimulationStatus>> {
    tracing::debug!("Getting status of simulation: {}", id);

    let status = simulation_service::get_status(&state, &SimulationId::from(id))?;
    Ok(Json(status))
}

/// POST /api/simulate/cleanup/{id}
/// Forget a simulation; always succeeds
pub async fn cleanup_simulation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    simulation_service::cleanup(&state, &SimulationId::from(id)).await;
    StatusCode::OK
}
