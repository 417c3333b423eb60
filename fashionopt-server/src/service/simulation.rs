//! Simulation Service
//!
//! Business logic for launching, inspecting and cleaning up simulation jobs.

use fashionopt_core::domain::simulation::{SimulationId, SimulationStatus};
use fashionopt_core::dto::simulation::SimulationParameters;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::repository::simulation_repository;
use crate::state::AppState;

const DEFAULT_FILE_NAME: &str = "products.xlsx";

/// Service error type
#[derive(Debug)]
pub enum SimulationJobError {
    NotFound(SimulationId),
    MissingFile,
    Storage(std::io::Error),
}

impl From<std::io::Error> for SimulationJobError {
    fn from(err: std::io::Error) -> Self {
        SimulationJobError::Storage(err)
    }
}

/// A submission as read from the multipart form
#[derive(Debug, Default)]
pub struct SimulationUpload {
    pub file_name: Option<String>,
    pub file: Option<Vec<u8>>,
    pub fields: HashMap<String, String>,
}

/// Create a job and start both optimizers
///
/// Rejected parameters still create the job: it is immediately marked as a
/// validation error so the client learns about it through polling.
pub async fn launch_simulation(
    state: &AppState,
    upload: SimulationUpload,
) -> Result<SimulationId, SimulationJobError> {
    let file = upload
        .file
        .filter(|bytes| !bytes.is_empty())
        .ok_or(SimulationJobError::MissingFile)?;

    let status = simulation_repository::create(&state.store);
    let Some(simulation_id) = status.simulation_id else {
        return Err(SimulationJobError::Storage(std::io::Error::other(
            "created simulation has no ID",
        )));
    };

    tracing::info!("Simulation created: {}", simulation_id);

    let params = SimulationParameters::from_fields(&upload.fields)
        .and_then(|params| params.validate().map(|_| params));
    let params = match params {
        Ok(params) => params,
        Err(err) => {
            tracing::warn!("Simulation {} rejected: {}", simulation_id, err);
            simulation_repository::mark_validation_error(&state.store, &simulation_id, err.to_string());
            return Ok(simulation_id);
        }
    };

    let path = match store_upload(state, &simulation_id, upload.file_name.as_deref(), &file).await {
        Ok(path) => path,
        Err(err) => {
            tracing::error!("Failed to store upload for simulation {}: {}", simulation_id, err);
            simulation_repository::record_setup_failure(
                &state.store,
                &simulation_id,
                format!("Failed to store uploaded file: {}", err),
            );
            return Err(err.into());
        }
    };

    state.runner.spawn(&simulation_id, &path, &params);
    Ok(simulation_id)
}

async fn store_upload(
    state: &AppState,
    simulation_id: &SimulationId,
    file_name: Option<&str>,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    let dir = state.job_dir(simulation_id).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid simulation ID {}", simulation_id),
        )
    })?;
    tokio::fs::create_dir_all(&dir).await?;

    let path = dir.join(sanitize_file_name(file_name));
    tokio::fs::write(&path, bytes).await?;

    tracing::debug!("Stored {} bytes at {}", bytes.len(), path.display());
    Ok(path)
}

/// Keeps only the final path component of a client-supplied name
fn sanitize_file_name(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name.trim()).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string()
}

/// Get the status of a job
pub fn get_status(state: &AppState, id: &SimulationId) -> Result<SimulationStatus, SimulationJobError> {
    simulation_repository::find_by_id(&state.store, id)
        .ok_or_else(|| SimulationJobError::NotFound(id.clone()))
}

/// Forget a job: stop its optimizers and remove its uploaded file
///
/// Unknown IDs are not an error.
pub async fn cleanup(state: &AppState, id: &SimulationId) {
    state.runner.cancel(id);
    let existed = simulation_repository::delete(&state.store, id);

    if existed {
        remove_job_dir(state, id).await;
        tracing::info!("Simulation {} cleaned up", id);
    } else {
        tracing::debug!("Cleanup requested for unknown simulation {}", id);
    }
}

async fn remove_job_dir(state: &AppState, id: &SimulationId) {
    let Some(dir) = state.job_dir(id) else {
        tracing::warn!("Refusing to remove files of simulation {}: not a plain ID", id);
        return;
    };

    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!("Failed to remove files of simulation {}: {}", id, err),
    }
}

/// Periodically discards jobs nobody cleaned up
pub fn spawn_expiry_sweeper(state: AppState, ttl: Duration, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let expired = simulation_repository::delete_expired(&state.store, ttl, chrono::Utc::now());
            for id in &expired {
                state.runner.cancel(id);
                remove_job_dir(&state, id).await;
            }

            if !expired.is_empty() {
                tracing::info!("Discarded {} expired simulation(s)", expired.len());
            }
        }
    })
}
