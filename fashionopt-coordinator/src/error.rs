//! Error taxonomy of a simulation run, as seen by the coordinator

use fashionopt_client::ClientError;
use fashionopt_core::domain::message::Severity;
use fashionopt_core::domain::simulation::{OverallStatus, SimulationId};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The submission failed local validation; nothing was sent
    #[error("{0}")]
    InvalidInput(String),

    /// The server rejected the submission or could not be reached
    #[error("Error starting simulation: {0}")]
    Submission(String),

    #[error("Simulation request timed out after {} seconds. Please try again.", .0.as_secs())]
    SubmissionTimeout(Duration),

    /// A status request failed for a reason other than 404
    #[error("Error fetching simulation status: {0}")]
    PollingTransport(String),

    #[error("Simulation ID {0} expired or not found.")]
    JobNotFound(SimulationId),

    #[error("Failed to parse status response: {detail}. Raw response: {payload}")]
    MalformedStatus { detail: String, payload: String },

    #[error("Unrecognized simulation status '{0}'")]
    UnknownStatus(String),

    /// The job ended in an error status
    #[error("{message}")]
    Algorithm {
        status: OverallStatus,
        message: String,
    },

    /// Both algorithms ran but at least one found no profitable solution
    #[error("{0}")]
    Infeasible(String),

    /// Another simulation is still active on this coordinator
    #[error("A simulation is already in progress. Please wait for it to finish.")]
    AlreadyActive,
}

impl SimulationError {
    pub fn severity(&self) -> Severity {
        match self {
            SimulationError::Infeasible(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether the job was never created on the server
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            SimulationError::InvalidInput(_)
                | SimulationError::Submission(_)
                | SimulationError::SubmissionTimeout(_)
        )
    }

    /// Maps a failed submission request
    pub(crate) fn from_submission(err: ClientError) -> Self {
        match err {
            ClientError::Timeout(after) => SimulationError::SubmissionTimeout(after),
            other => SimulationError::Submission(other.to_string()),
        }
    }

    /// Maps a failed status request
    pub(crate) fn from_status(simulation_id: &SimulationId, err: ClientError) -> Self {
        match err {
            ClientError::NotFound(_) => SimulationError::JobNotFound(simulation_id.clone()),
            ClientError::ApiError { status: 404, .. } => {
                SimulationError::JobNotFound(simulation_id.clone())
            }
            ClientError::MalformedStatus { detail, payload } => {
                SimulationError::MalformedStatus { detail, payload }
            }
            ClientError::UnknownStatus(status) => SimulationError::UnknownStatus(status),
            other => SimulationError::PollingTransport(other.to_string()),
        }
    }

    /// Whether the retry policy may absorb this failure
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, SimulationError::PollingTransport(_))
    }
}
