//! Polling session state
//!
//! One [`PollingSession`] belongs to one coordinator. It holds the active job
//! ID, the in-progress guard, the per-algorithm error log and the transport
//! failure counter. Every mutation that concerns a job takes that job's ID and
//! is ignored when the ID is no longer the active one.

use fashionopt_core::domain::simulation::{Algorithm, SimulationId, SimulationStatus};
use fashionopt_core::lifecycle::ErrorLog;

#[derive(Debug, Default)]
pub struct PollingSession {
    active: Option<SimulationId>,
    in_progress: bool,
    errors: ErrorLog,
    consecutive_failures: u32,
}

/// What is left of a session once its job is finished
#[derive(Debug)]
pub struct FinishedSession {
    pub simulation_id: SimulationId,
    pub errors: ErrorLog,
}

impl PollingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// No job is active and no submission is in flight
    pub fn is_idle(&self) -> bool {
        !self.in_progress && self.active.is_none()
    }

    pub fn active_id(&self) -> Option<&SimulationId> {
        self.active.as_ref()
    }

    pub fn is_current(&self, simulation_id: &SimulationId) -> bool {
        self.active.as_ref() == Some(simulation_id)
    }

    /// Sets the in-progress guard; false when the session is busy
    pub fn begin_submission(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.in_progress = true;
        true
    }

    /// Releases the guard after a submission that created no job
    pub fn abort_submission(&mut self) {
        if self.active.is_none() {
            self.in_progress = false;
        }
    }

    /// Makes `simulation_id` the active job with a fresh error log
    pub fn activate(&mut self, simulation_id: SimulationId) {
        self.active = Some(simulation_id);
        self.in_progress = true;
        self.errors = ErrorLog::new();
        self.consecutive_failures = 0;
    }

    /// Records the errors flagged by a status of the active job
    ///
    /// Returns `None` if `simulation_id` is stale, otherwise the newly
    /// surfaced errors.
    pub fn record_status(
        &mut self,
        simulation_id: &SimulationId,
        status: &SimulationStatus,
    ) -> Option<Vec<(Algorithm, String)>> {
        if !self.is_current(simulation_id) {
            return None;
        }
        self.consecutive_failures = 0;
        Some(self.errors.record(status))
    }

    /// Counts a failed status request, returning the current streak
    pub fn record_failure(&mut self, simulation_id: &SimulationId) -> Option<u32> {
        if !self.is_current(simulation_id) {
            return None;
        }
        self.consecutive_failures += 1;
        Some(self.consecutive_failures)
    }

    /// Takes the job out of the session and returns it to idle
    ///
    /// Only the first call for a given job gets `Some`.
    pub fn finish(&mut self, simulation_id: &SimulationId) -> Option<FinishedSession> {
        if !self.is_current(simulation_id) {
            return None;
        }

        let simulation_id = self.active.take()?;
        self.in_progress = false;
        self.consecutive_failures = 0;

        Some(FinishedSession {
            simulation_id,
            errors: std::mem::take(&mut self.errors),
        })
    }
}
