//! Simulation job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::result::CombinedResult;

/// Opaque identifier of a simulation job, minted by the server on submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationId(String);

impl SimulationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SimulationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SimulationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The two optimizers every simulation runs side by side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "GA")]
    Genetic,
    #[serde(rename = "ACO")]
    AntColony,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Genetic, Algorithm::AntColony];

    /// Short code used on the wire and in server-side error messages
    pub fn code(self) -> &'static str {
        match self {
            Algorithm::Genetic => "GA",
            Algorithm::AntColony => "ACO",
        }
    }

    /// Human readable name used in user-facing messages
    pub fn display_name(self) -> &'static str {
        match self {
            Algorithm::Genetic => "Genetic Algorithm",
            Algorithm::AntColony => "Ant Colony Optimization",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("GA") {
            Ok(Algorithm::Genetic)
        } else if s.eq_ignore_ascii_case("ACO") {
            Ok(Algorithm::AntColony)
        } else {
            Err(format!("unknown algorithm '{}'", s))
        }
    }
}

/// Overall status of a simulation job as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Pending,
    Running,
    Completed,
    /// Both algorithms finished but at least one produced zero or negative profit
    InvisibleSolution,
    ShelfSpaceError,
    ValidationError,
    Error,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Pending => "PENDING",
            OverallStatus::Running => "RUNNING",
            OverallStatus::Completed => "COMPLETED",
            OverallStatus::InvisibleSolution => "INVISIBLE_SOLUTION",
            OverallStatus::ShelfSpaceError => "SHELF_SPACE_ERROR",
            OverallStatus::ValidationError => "VALIDATION_ERROR",
            OverallStatus::Error => "ERROR",
        }
    }

    /// Whether no further transition can leave this status
    pub fn is_terminal(self) -> bool {
        !matches!(self, OverallStatus::Pending | OverallStatus::Running)
    }

    /// Whether a job in this status exposes usable product data
    pub fn carries_result(self) -> bool {
        matches!(
            self,
            OverallStatus::Completed | OverallStatus::InvisibleSolution
        )
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverallStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OverallStatus::Pending),
            "RUNNING" => Ok(OverallStatus::Running),
            "COMPLETED" => Ok(OverallStatus::Completed),
            "INVISIBLE_SOLUTION" => Ok(OverallStatus::InvisibleSolution),
            "SHELF_SPACE_ERROR" => Ok(OverallStatus::ShelfSpaceError),
            "VALIDATION_ERROR" => Ok(OverallStatus::ValidationError),
            "ERROR" => Ok(OverallStatus::Error),
            other => Err(StatusParseError::UnknownStatus(other.to_string())),
        }
    }
}

/// Errors raised while decoding a status payload
#[derive(Debug, Error)]
pub enum StatusParseError {
    /// The payload is not the expected JSON structure
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload names a status outside the closed set
    #[error("unrecognized simulation status '{0}'")]
    UnknownStatus(String),
}

/// Progress of one algorithm within a job
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlgorithmProgress {
    /// Percentage 0-100, absent until the algorithm reports
    pub progress: Option<f64>,
    /// Seconds remaining, absent until the algorithm reports
    pub estimated_time_remaining: Option<f64>,
    pub finished: bool,
    pub has_error: bool,
}

/// Server-tracked state of a simulation job
///
/// Only the server mutates this structure (see [`crate::lifecycle`]); clients
/// decode it from the status endpoint with [`SimulationStatus::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_id: Option<SimulationId>,
    pub overall_status: OverallStatus,
    pub ga_progress: Option<f64>,
    pub ga_estimated_time_remaining: Option<f64>,
    pub aco_progress: Option<f64>,
    pub aco_estimated_time_remaining: Option<f64>,
    pub result: Option<CombinedResult>,
    pub error_message: Option<String>,
    pub ga_finished: bool,
    pub aco_finished: bool,
    pub ga_has_error: bool,
    pub aco_has_error: bool,
}

/// Wire shape of the status payload before the status string is checked
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSimulationStatus {
    #[serde(default)]
    simulation_id: Option<SimulationId>,
    overall_status: String,
    #[serde(default)]
    ga_progress: Option<f64>,
    #[serde(default)]
    ga_estimated_time_remaining: Option<f64>,
    #[serde(default)]
    aco_progress: Option<f64>,
    #[serde(default)]
    aco_estimated_time_remaining: Option<f64>,
    #[serde(default)]
    result: Option<CombinedResult>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    ga_finished: bool,
    #[serde(default)]
    aco_finished: bool,
    #[serde(default)]
    ga_has_error: bool,
    #[serde(default)]
    aco_has_error: bool,
}

impl SimulationStatus {
    /// A freshly created job: nothing has run yet
    pub fn pending(simulation_id: SimulationId) -> Self {
        Self {
            simulation_id: Some(simulation_id),
            overall_status: OverallStatus::Pending,
            ga_progress: Some(0.0),
            ga_estimated_time_remaining: Some(0.0),
            aco_progress: Some(0.0),
            aco_estimated_time_remaining: Some(0.0),
            result: None,
            error_message: None,
            ga_finished: false,
            aco_finished: false,
            ga_has_error: false,
            aco_has_error: false,
        }
    }

    /// Decodes a status payload, rejecting unknown status strings
    pub fn from_json(raw: &str) -> Result<Self, StatusParseError> {
        let raw: RawSimulationStatus = serde_json::from_str(raw)?;
        let overall_status = raw.overall_status.parse::<OverallStatus>()?;

        Ok(Self {
            simulation_id: raw.simulation_id,
            overall_status,
            ga_progress: raw.ga_progress,
            ga_estimated_time_remaining: raw.ga_estimated_time_remaining,
            aco_progress: raw.aco_progress,
            aco_estimated_time_remaining: raw.aco_estimated_time_remaining,
            result: raw.result,
            error_message: raw.error_message,
            ga_finished: raw.ga_finished,
            aco_finished: raw.aco_finished,
            ga_has_error: raw.ga_has_error,
            aco_has_error: raw.aco_has_error,
        })
    }

    /// Per-algorithm view of the flat wire fields
    pub fn algorithm(&self, algorithm: Algorithm) -> AlgorithmProgress {
        match algorithm {
            Algorithm::Genetic => AlgorithmProgress {
                progress: self.ga_progress,
                estimated_time_remaining: self.ga_estimated_time_remaining,
                finished: self.ga_finished,
                has_error: self.ga_has_error,
            },
            Algorithm::AntColony => AlgorithmProgress {
                progress: self.aco_progress,
                estimated_time_remaining: self.aco_estimated_time_remaining,
                finished: self.aco_finished,
                has_error: self.aco_has_error,
            },
        }
    }

    /// Authoritative completion signal: both algorithms are done
    pub fn both_finished(&self) -> bool {
        self.ga_finished && self.aco_finished
    }

    pub fn any_error(&self) -> bool {
        self.ga_has_error || self.aco_has_error
    }
}
