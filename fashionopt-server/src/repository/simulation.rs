//! Simulation Repository
//!
//! All reads and writes of job state go through here. Writes are expressed as
//! lifecycle events so the state machine stays the only thing deciding
//! transitions.

use chrono::{DateTime, Utc};
use fashionopt_core::domain::result::OptimizationResult;
use fashionopt_core::domain::simulation::{Algorithm, OverallStatus, SimulationId, SimulationStatus};
use fashionopt_core::lifecycle::JobEvent;
use std::time::Duration;

use crate::store::{SimulationRecord, SimulationStore};

/// Create a new pending job
pub fn create(store: &SimulationStore) -> SimulationStatus {
    let id = SimulationId::generate();
    let status = SimulationStatus::pending(id.clone());

    store.write().insert(
        id,
        SimulationRecord {
            status: status.clone(),
            created_at: Utc::now(),
        },
    );

    status
}

/// Find a job by ID
pub fn find_by_id(store: &SimulationStore, id: &SimulationId) -> Option<SimulationStatus> {
    store.read().get(id).map(|record| record.status.clone())
}

/// Apply a lifecycle event to a job
///
/// Returns the resulting overall status, or `None` when the job is unknown or
/// already terminal. Both cases are expected: the client may have cleaned the
/// job up while an optimizer was still reporting.
pub fn apply(store: &SimulationStore, id: &SimulationId, event: JobEvent) -> Option<OverallStatus> {
    let mut records = store.write();
    let Some(record) = records.get_mut(id) else {
        tracing::debug!("Ignoring update for unknown simulation {}", id);
        return None;
    };

    match record.status.apply(event) {
        Ok(status) => Some(status),
        Err(err) => {
            tracing::warn!("Ignoring update for simulation {}: {}", id, err);
            None
        }
    }
}

/// Record intermediate progress of one optimizer
pub fn update_progress(
    store: &SimulationStore,
    id: &SimulationId,
    algorithm: Algorithm,
    progress: f64,
    estimated_time_remaining: f64,
) -> Option<OverallStatus> {
    apply(
        store,
        id,
        JobEvent::Progress {
            algorithm,
            progress,
            estimated_time_remaining,
        },
    )
}

/// Record the final result of one optimizer
pub fn record_result(
    store: &SimulationStore,
    id: &SimulationId,
    algorithm: Algorithm,
    result: OptimizationResult,
) -> Option<OverallStatus> {
    apply(store, id, JobEvent::Finished { algorithm, result })
}

/// Record a failure of one optimizer
pub fn record_error(
    store: &SimulationStore,
    id: &SimulationId,
    algorithm: Algorithm,
    message: impl Into<String>,
) -> Option<OverallStatus> {
    apply(
        store,
        id,
        JobEvent::Failed {
            algorithm,
            message: message.into(),
        },
    )
}

/// Record that the job could not be started at all
pub fn record_setup_failure(
    store: &SimulationStore,
    id: &SimulationId,
    message: impl Into<String>,
) -> Option<OverallStatus> {
    apply(
        store,
        id,
        JobEvent::SetupFailed {
            message: message.into(),
        },
    )
}

pub fn mark_shelf_space_error(
    store: &SimulationStore,
    id: &SimulationId,
    required: f64,
    available: f64,
) -> Option<OverallStatus> {
    apply(
        store,
        id,
        JobEvent::ShelfSpaceExceeded {
            required,
            available,
        },
    )
}

pub fn mark_validation_error(
    store: &SimulationStore,
    id: &SimulationId,
    message: impl Into<String>,
) -> Option<OverallStatus> {
    apply(
        store,
        id,
        JobEvent::ValidationFailed {
            message: message.into(),
        },
    )
}

/// Delete a job, returning whether it existed
pub fn delete(store: &SimulationStore, id: &SimulationId) -> bool {
    store.write().remove(id).is_some()
}

/// Delete every job created more than `max_age` before `now`
pub fn delete_expired(
    store: &SimulationStore,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Vec<SimulationId> {
    let Ok(max_age) = chrono::Duration::from_std(max_age) else {
        return Vec::new();
    };
    let cutoff = now - max_age;

    let mut records = store.write();
    let expired: Vec<SimulationId> = records
        .iter()
        .filter(|(_, record)| record.created_at < cutoff)
        .map(|(id, _)| id.clone())
        .collect();

    for id in &expired {
        records.remove(id);
    }

    expired
}
