//! Job lifecycle state machine
//!
//! `PENDING -> RUNNING -> {COMPLETED, INVISIBLE_SOLUTION, SHELF_SPACE_ERROR,
//! VALIDATION_ERROR, ERROR}`. A pending job may also be rejected straight into
//! one of the error states before anything runs.
//!
//! Two sides use this module:
//! - the server drives a job forward with [`SimulationStatus::apply`];
//! - clients turn each polled status into progress or a terminal outcome with
//!   [`evaluate`], and accumulate per-algorithm errors with [`ErrorLog`].

use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::message::Severity;
use crate::domain::result::{CombinedResult, OptimizationResult};
use crate::domain::simulation::{Algorithm, AlgorithmProgress, OverallStatus, SimulationStatus};

pub const COMPLETED_MESSAGE: &str = "Simulation completed successfully! Results are displayed below.";
pub const INVISIBLE_SOLUTION_MESSAGE: &str = "Invisible Solution - One or both algorithms returned zero or negative profit. This may indicate insufficient budget or unfavorable market conditions.";
pub const SHELF_SPACE_DEFAULT_MESSAGE: &str =
    "No Space in total shelf space - Required shelf space exceeds available capacity.";
pub const VALIDATION_DEFAULT_MESSAGE: &str =
    "Validation error - Please check your input parameters.";
pub const ERROR_DEFAULT_MESSAGE: &str =
    "Simulation completed with errors. Please check the error details below.";
pub const MISSING_RESULT_MESSAGE: &str = "Simulation finished, but no results data was received. Please check server logs for detailed errors.";

/// Server-side error message stored when a solution turns out infeasible
pub const INFEASIBLE_SERVER_MESSAGE: &str =
    "Infeasible Solution - One or both algorithms returned zero or negative profit";

// =============================================================================
// Server-side transitions
// =============================================================================

/// Something that happened to a job on the server
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// An optimizer reported intermediate progress
    Progress {
        algorithm: Algorithm,
        progress: f64,
        estimated_time_remaining: f64,
    },
    /// An optimizer produced its final result
    Finished {
        algorithm: Algorithm,
        result: OptimizationResult,
    },
    /// An optimizer failed
    Failed { algorithm: Algorithm, message: String },
    /// The job could not be started at all
    SetupFailed { message: String },
    /// The products do not fit on the available shelves
    ShelfSpaceExceeded { required: f64, available: f64 },
    /// The submitted parameters were rejected
    ValidationFailed { message: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("simulation is already in terminal state {0}")]
    AlreadyTerminal(OverallStatus),
}

/// Whether the state machine allows moving from `from` to `to`
pub fn can_transition(from: OverallStatus, to: OverallStatus) -> bool {
    if from == to {
        return true;
    }

    match from {
        OverallStatus::Pending => true,
        OverallStatus::Running => to != OverallStatus::Pending,
        _ => false,
    }
}

impl SimulationStatus {
    /// Applies a server-side event and returns the resulting overall status
    ///
    /// Terminal jobs reject every event.
    pub fn apply(&mut self, event: JobEvent) -> Result<OverallStatus, TransitionError> {
        if self.overall_status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal(self.overall_status));
        }

        match event {
            JobEvent::Progress {
                algorithm,
                progress,
                estimated_time_remaining,
            } => {
                if !self.algorithm(algorithm).finished {
                    self.set_progress(algorithm, progress, estimated_time_remaining);
                }
                self.move_to(OverallStatus::Running);
            }
            JobEvent::Finished { algorithm, result } => {
                self.result
                    .get_or_insert_with(CombinedResult::default)
                    .set(algorithm, result);
                self.set_progress(algorithm, 100.0, 0.0);
                self.set_finished(algorithm, false);
                self.settle();
            }
            JobEvent::Failed { algorithm, message } => {
                self.append_error(algorithm.code(), &message);
                self.set_progress(algorithm, 100.0, 0.0);
                self.set_finished(algorithm, true);
                if self.both_finished() {
                    self.move_to(OverallStatus::Error);
                }
            }
            JobEvent::SetupFailed { message } => {
                self.append_error("Setup", &message);
                self.ga_finished = true;
                self.aco_finished = true;
                self.move_to(OverallStatus::Error);
            }
            JobEvent::ShelfSpaceExceeded {
                required,
                available,
            } => {
                self.error_message = Some(format!(
                    "No Space in total shelf space. Required: {}, Available: {}",
                    required, available
                ));
                self.ga_finished = true;
                self.aco_finished = true;
                self.move_to(OverallStatus::ShelfSpaceError);
            }
            JobEvent::ValidationFailed { message } => {
                self.error_message = Some(message);
                self.ga_finished = true;
                self.aco_finished = true;
                self.move_to(OverallStatus::ValidationError);
            }
        }

        Ok(self.overall_status)
    }

    fn move_to(&mut self, next: OverallStatus) {
        if can_transition(self.overall_status, next) {
            self.overall_status = next;
        }
    }

    fn set_progress(&mut self, algorithm: Algorithm, progress: f64, eta: f64) {
        let progress = progress.clamp(0.0, 100.0);
        let eta = eta.max(0.0);
        match algorithm {
            Algorithm::Genetic => {
                self.ga_progress = Some(progress);
                self.ga_estimated_time_remaining = Some(eta);
            }
            Algorithm::AntColony => {
                self.aco_progress = Some(progress);
                self.aco_estimated_time_remaining = Some(eta);
            }
        }
    }

    fn set_finished(&mut self, algorithm: Algorithm, with_error: bool) {
        match algorithm {
            Algorithm::Genetic => {
                self.ga_finished = true;
                self.ga_has_error |= with_error;
            }
            Algorithm::AntColony => {
                self.aco_finished = true;
                self.aco_has_error |= with_error;
            }
        }
    }

    fn append_error(&mut self, source: &str, message: &str) {
        let line = format!("{} Error: {}", source, message);
        self.error_message = Some(match self.error_message.take() {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, line),
            _ => line,
        });
    }

    /// Decides the overall status once both optimizers are done
    fn settle(&mut self) {
        if !self.both_finished() {
            return;
        }

        if self.any_error() {
            self.move_to(OverallStatus::Error);
            return;
        }

        let infeasible = self.result.as_ref().is_some_and(|combined| {
            Algorithm::ALL
                .iter()
                .filter_map(|alg| combined.get(*alg))
                .any(|result| !result.is_profitable())
        });

        if infeasible {
            self.error_message = Some(INFEASIBLE_SERVER_MESSAGE.to_string());
            self.move_to(OverallStatus::InvisibleSolution);
        } else {
            self.move_to(OverallStatus::Completed);
        }
    }
}

// =============================================================================
// Client-side evaluation
// =============================================================================

/// Progress of a job that is still running
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub overall_status: OverallStatus,
    pub genetic: AlgorithmProgress,
    pub ant_colony: AlgorithmProgress,
}

impl ProgressSnapshot {
    pub fn from_status(status: &SimulationStatus) -> Self {
        Self {
            overall_status: status.overall_status,
            genetic: status.algorithm(Algorithm::Genetic),
            ant_colony: status.algorithm(Algorithm::AntColony),
        }
    }

    pub fn algorithm(&self, algorithm: Algorithm) -> &AlgorithmProgress {
        match algorithm {
            Algorithm::Genetic => &self.genetic,
            Algorithm::AntColony => &self.ant_colony,
        }
    }

    /// Largest positive ETA across both algorithms
    pub fn max_eta(&self) -> Option<f64> {
        let ga = self.genetic.estimated_time_remaining.unwrap_or(0.0);
        let aco = self.ant_colony.estimated_time_remaining.unwrap_or(0.0);
        let eta = ga.max(aco);
        (eta > 0.0).then_some(eta)
    }

    pub fn running_message(&self) -> String {
        match self.max_eta() {
            Some(eta) => format!(
                "Simulation is running... Estimated time remaining: {:.0} seconds",
                eta
            ),
            None => "Simulation is running...".to_string(),
        }
    }
}

/// Final, user-facing outcome of a job
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalOutcome {
    pub status: OverallStatus,
    pub severity: Severity,
    pub message: String,
    /// Present only for statuses that carry usable product data
    pub result: Option<CombinedResult>,
}

/// What a single polled status means to the client
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    InProgress(ProgressSnapshot),
    Terminal(TerminalOutcome),
}

/// Interprets a polled status
///
/// `gaFinished && acoFinished` is the only completion signal; the message and
/// severity come from `overallStatus`.
pub fn evaluate(status: &SimulationStatus) -> Observation {
    if !status.both_finished() {
        return Observation::InProgress(ProgressSnapshot::from_status(status));
    }

    let server_message = status
        .error_message
        .as_deref()
        .filter(|m| !m.trim().is_empty());
    let error = |default: &str| TerminalOutcome {
        status: status.overall_status,
        severity: Severity::Error,
        message: server_message.unwrap_or(default).to_string(),
        result: None,
    };

    let outcome = match status.overall_status {
        OverallStatus::Completed | OverallStatus::InvisibleSolution => match &status.result {
            Some(result) => {
                let (severity, message) = if status.overall_status == OverallStatus::Completed {
                    (Severity::Success, COMPLETED_MESSAGE)
                } else {
                    (Severity::Warning, INVISIBLE_SOLUTION_MESSAGE)
                };
                TerminalOutcome {
                    status: status.overall_status,
                    severity,
                    message: message.to_string(),
                    result: Some(result.clone()),
                }
            }
            None => TerminalOutcome {
                status: status.overall_status,
                severity: Severity::Error,
                message: MISSING_RESULT_MESSAGE.to_string(),
                result: None,
            },
        },
        OverallStatus::ShelfSpaceError => error(SHELF_SPACE_DEFAULT_MESSAGE),
        OverallStatus::ValidationError => error(VALIDATION_DEFAULT_MESSAGE),
        OverallStatus::Error => error(ERROR_DEFAULT_MESSAGE),
        OverallStatus::Pending | OverallStatus::Running => TerminalOutcome {
            status: status.overall_status,
            severity: Severity::Warning,
            message: format!(
                "Simulation finished with overall status: {}",
                status.overall_status
            ),
            result: None,
        },
    };

    Observation::Terminal(outcome)
}

/// Per-algorithm error messages accumulated across polls
///
/// Entries are keyed by algorithm, so polling the same payload again never
/// duplicates a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLog {
    entries: BTreeMap<Algorithm, String>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the errors flagged in `status`
    ///
    /// Returns the entries that are new or whose text changed.
    pub fn record(&mut self, status: &SimulationStatus) -> Vec<(Algorithm, String)> {
        let mut changed = Vec::new();

        for algorithm in Algorithm::ALL {
            if !status.algorithm(algorithm).has_error {
                continue;
            }

            let detail = status
                .error_message
                .as_deref()
                .and_then(|m| algorithm_detail(m, algorithm))
                .unwrap_or_else(|| format!("An unknown {} error occurred.", algorithm.code()));
            let line = format!("{} Error: {}", algorithm.display_name(), detail);

            if self.entries.get(&algorithm) != Some(&line) {
                self.entries.insert(algorithm, line.clone());
                changed.push((algorithm, line));
            }
        }

        changed
    }

    pub fn get(&self, algorithm: Algorithm) -> Option<&str> {
        self.entries.get(&algorithm).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// All messages, one per line, GA first
    pub fn render(&self) -> String {
        self.entries
            .values()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Picks the part of a shared error message that belongs to `algorithm`
///
/// The server joins failures as `"{CODE} Error: ..."` lines. A message with no
/// tagged lines at all is taken whole; one tagged only for the other algorithm
/// says nothing about this one.
fn algorithm_detail(message: &str, algorithm: Algorithm) -> Option<String> {
    let prefix = format!("{} Error:", algorithm.code());
    let mut tagged = false;
    let mut own = None;

    for line in message.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(prefix.as_str()) {
            own = Some(rest.trim());
        }
        tagged |= Algorithm::ALL
            .iter()
            .any(|a| line.starts_with(&format!("{} Error:", a.code())));
    }

    match own {
        Some(detail) if !detail.is_empty() => Some(detail.to_string()),
        Some(_) => None,
        None if tagged => None,
        None => Some(message.trim().to_string()).filter(|m| !m.is_empty()),
    }
}
