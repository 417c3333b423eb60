//! Messages sent from the coordinator to the presentation layer

use fashionopt_core::domain::message::Severity;
use fashionopt_core::domain::result::CombinedResult;
use fashionopt_core::domain::simulation::{Algorithm, SimulationId};
use fashionopt_core::lifecycle::{ErrorLog, ProgressSnapshot};

use crate::error::SimulationError;

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// The server accepted the submission
    Submitted { simulation_id: SimulationId },

    /// A non-terminal status arrived
    Progress {
        simulation_id: SimulationId,
        snapshot: ProgressSnapshot,
        message: String,
    },

    /// An algorithm error was surfaced for the first time (or changed)
    AlgorithmError {
        simulation_id: SimulationId,
        algorithm: Algorithm,
        message: String,
    },

    /// The run is over; sent exactly once per run
    Finished(FinalReport),
}

/// The single terminal message of a run
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReport {
    /// `None` when the job was never created
    pub simulation_id: Option<SimulationId>,
    pub severity: Severity,
    pub message: String,
    /// Present on success and soft success only
    pub result: Option<CombinedResult>,
    pub error: Option<SimulationError>,
    /// Every algorithm error surfaced during the run
    pub algorithm_errors: ErrorLog,
}

impl FinalReport {
    pub fn new(
        simulation_id: SimulationId,
        severity: Severity,
        message: impl Into<String>,
        result: Option<CombinedResult>,
    ) -> Self {
        Self {
            simulation_id: Some(simulation_id),
            severity,
            message: message.into(),
            result,
            error: None,
            algorithm_errors: ErrorLog::default(),
        }
    }

    pub fn failure(simulation_id: Option<SimulationId>, error: SimulationError) -> Self {
        Self {
            simulation_id,
            severity: error.severity(),
            message: error.to_string(),
            result: None,
            error: Some(error),
            algorithm_errors: ErrorLog::default(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
