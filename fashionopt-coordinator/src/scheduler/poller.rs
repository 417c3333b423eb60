//! Status poller
//!
//! Polls the status endpoint of one simulation on a fixed interval until the
//! run terminates or the simulation stops being the active one. Each request
//! is awaited before the next tick, and the job ID is checked against the
//! session both before sending and after receiving.

use std::sync::Arc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use fashionopt_client::ClientError;
use fashionopt_core::domain::simulation::{OverallStatus, SimulationId, SimulationStatus};
use fashionopt_core::lifecycle::{ErrorLog, Observation, TerminalOutcome, evaluate};

use crate::coordinator::Inner;
use crate::error::SimulationError;
use crate::events::{CoordinatorEvent, FinalReport};

enum PollOutcome {
    /// Keep polling
    Continue,
    /// The run is over
    Finished(FinalReport),
    /// The simulation is no longer the active one
    Stale,
}

pub(crate) struct StatusPoller {
    inner: Arc<Inner>,
    simulation_id: SimulationId,
}

impl StatusPoller {
    pub(crate) fn new(inner: Arc<Inner>, simulation_id: SimulationId) -> Self {
        Self {
            inner,
            simulation_id,
        }
    }

    /// Runs the polling loop
    pub(crate) async fn run(self) {
        let period = self.inner.config.poll_interval;
        info!(
            "Polling simulation {} (interval: {:?})",
            self.simulation_id, period
        );

        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if !self.inner.is_current(&self.simulation_id) {
                debug!(
                    "Simulation {} is no longer active, stopping poller",
                    self.simulation_id
                );
                break;
            }

            debug!("Polling status of simulation {}", self.simulation_id);
            let response = self.inner.api.fetch_status(&self.simulation_id).await;

            if !self.inner.is_current(&self.simulation_id) {
                warn!(
                    "Discarding stale status response for simulation {}",
                    self.simulation_id
                );
                break;
            }

            match self.handle_response(response) {
                PollOutcome::Continue => {}
                PollOutcome::Finished(report) => {
                    self.inner.terminate(&self.simulation_id, report).await;
                    break;
                }
                PollOutcome::Stale => break,
            }
        }
    }

    fn handle_response(&self, response: fashionopt_client::Result<SimulationStatus>) -> PollOutcome {
        match response {
            Ok(status) => self.handle_status(&status),
            Err(err) => self.handle_failure(err),
        }
    }

    fn handle_status(&self, status: &SimulationStatus) -> PollOutcome {
        let new_errors = self.inner.session().record_status(&self.simulation_id, status);
        let Some(new_errors) = new_errors else {
            return PollOutcome::Stale;
        };

        for (algorithm, message) in new_errors {
            warn!("Simulation {}: {}", self.simulation_id, message);
            self.inner.emit(CoordinatorEvent::AlgorithmError {
                simulation_id: self.simulation_id.clone(),
                algorithm,
                message,
            });
        }

        match evaluate(status) {
            Observation::InProgress(snapshot) => {
                let message = snapshot.running_message();
                debug!(
                    "Simulation {} is {} (GA {:?}%, ACO {:?}%)",
                    self.simulation_id,
                    snapshot.overall_status,
                    snapshot.genetic.progress,
                    snapshot.ant_colony.progress
                );
                self.inner.emit(CoordinatorEvent::Progress {
                    simulation_id: self.simulation_id.clone(),
                    snapshot,
                    message,
                });
                PollOutcome::Continue
            }
            Observation::Terminal(outcome) => PollOutcome::Finished(self.report(outcome)),
        }
    }

    fn report(&self, outcome: TerminalOutcome) -> FinalReport {
        let error = match outcome.status {
            OverallStatus::Completed if outcome.result.is_some() => None,
            OverallStatus::InvisibleSolution if outcome.result.is_some() => {
                Some(SimulationError::Infeasible(outcome.message.clone()))
            }
            OverallStatus::Pending | OverallStatus::Running => None,
            status => Some(SimulationError::Algorithm {
                status,
                message: outcome.message.clone(),
            }),
        };

        FinalReport {
            simulation_id: Some(self.simulation_id.clone()),
            severity: outcome.severity,
            message: outcome.message,
            result: outcome.result,
            error,
            algorithm_errors: ErrorLog::default(),
        }
    }

    fn handle_failure(&self, err: ClientError) -> PollOutcome {
        let error = SimulationError::from_status(&self.simulation_id, err);

        if error.is_retryable() {
            let streak = self.inner.session().record_failure(&self.simulation_id);
            let Some(streak) = streak else {
                return PollOutcome::Stale;
            };

            let limit = self.inner.config.status_retry_limit;
            if streak <= limit {
                warn!(
                    "Status request for simulation {} failed ({}/{}), retrying: {}",
                    self.simulation_id, streak, limit, error
                );
                return PollOutcome::Continue;
            }
        }

        PollOutcome::Finished(FinalReport::failure(Some(self.simulation_id.clone()), error))
    }
}
