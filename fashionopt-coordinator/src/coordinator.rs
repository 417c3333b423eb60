//! Simulation coordinator
//!
//! Submits a simulation, polls it until it ends, and reports exactly one
//! final message per run. A coordinator runs at most one simulation at a time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use fashionopt_client::{PricingClient, SimulationApi};
use fashionopt_core::domain::message::Severity;
use fashionopt_core::domain::simulation::SimulationId;
use fashionopt_core::dto::simulation::SimulationSubmission;

use crate::config::CoordinatorConfig;
use crate::error::{Result, SimulationError};
use crate::events::{CoordinatorEvent, FinalReport};
use crate::scheduler::StatusPoller;
use crate::session::PollingSession;

/// State shared between the coordinator and its polling task
pub(crate) struct Inner {
    pub(crate) api: Arc<dyn SimulationApi>,
    pub(crate) config: CoordinatorConfig,
    session: Mutex<PollingSession>,
    events: mpsc::UnboundedSender<CoordinatorEvent>,
}

impl Inner {
    pub(crate) fn session(&self) -> MutexGuard<'_, PollingSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_current(&self, simulation_id: &SimulationId) -> bool {
        self.session().is_current(simulation_id)
    }

    pub(crate) fn emit(&self, event: CoordinatorEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped, discarding coordinator event");
        }
    }

    /// Ends a run: idle session, one final message, one cleanup call
    ///
    /// Returns false if `simulation_id` was already terminated or replaced.
    pub(crate) async fn terminate(&self, simulation_id: &SimulationId, mut report: FinalReport) -> bool {
        let finished = self.session().finish(simulation_id);
        let Some(finished) = finished else {
            debug!("Simulation {} already terminated", simulation_id);
            return false;
        };

        report.algorithm_errors = finished.errors;
        match report.severity {
            Severity::Error => error!("Simulation {} failed: {}", simulation_id, report.message),
            Severity::Warning => warn!("Simulation {} ended: {}", simulation_id, report.message),
            _ => info!("Simulation {} ended: {}", simulation_id, report.message),
        }
        self.emit(CoordinatorEvent::Finished(report));

        match self.api.cleanup(simulation_id).await {
            Ok(()) => debug!("Cleaned up simulation {}", simulation_id),
            Err(e) => warn!("Failed to clean up simulation {}: {}", simulation_id, e),
        }

        true
    }
}

/// Releases the in-progress guard if a submission is abandoned midway
struct SubmissionGuard<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.session().abort_submission();
        }
    }
}

pub struct Coordinator {
    inner: Arc<Inner>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Creates a coordinator over any [`SimulationApi`]
    ///
    /// Events are delivered on the returned receiver.
    pub fn new(
        api: Arc<dyn SimulationApi>,
        config: CoordinatorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CoordinatorEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            api,
            config,
            session: Mutex::new(PollingSession::new()),
            events,
        });

        let coordinator = Self {
            inner,
            poll_task: Mutex::new(None),
        };
        (coordinator, receiver)
    }

    /// Creates a coordinator talking HTTP to `config.api_url`
    pub fn connect(config: CoordinatorConfig) -> (Self, mpsc::UnboundedReceiver<CoordinatorEvent>) {
        let client = PricingClient::new(config.api_url.clone())
            .with_submit_timeout(config.submit_timeout)
            .with_payload_display_limit(config.payload_display_limit);
        Self::new(Arc::new(client), config)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Whether a simulation is active or being submitted
    pub fn is_active(&self) -> bool {
        !self.inner.session().is_idle()
    }

    pub fn active_simulation(&self) -> Option<SimulationId> {
        self.inner.session().active_id().cloned()
    }

    /// Validates and submits a simulation, then starts polling it
    ///
    /// Rejected with [`SimulationError::AlreadyActive`] while another
    /// simulation is active or in flight; that rejection emits no message.
    /// Every other failure here means no job was created and is reported
    /// through a final message as well as the returned error.
    pub async fn start_simulation(&self, submission: SimulationSubmission) -> Result<SimulationId> {
        if !self.inner.session().begin_submission() {
            warn!("Rejecting submission: a simulation is already in progress");
            return Err(SimulationError::AlreadyActive);
        }
        let mut guard = SubmissionGuard {
            inner: &self.inner,
            armed: true,
        };

        if let Err(problems) = submission.validate() {
            return Err(self.reject_submission(SimulationError::InvalidInput(problems.to_string())));
        }

        info!(
            "Submitting simulation ({}, {} bytes)",
            submission.file_name,
            submission.file.len()
        );

        let timeout = self.inner.config.submit_timeout;
        let simulation_id = match time::timeout(timeout, self.inner.api.submit(&submission)).await {
            Ok(Ok(simulation_id)) => simulation_id,
            Ok(Err(e)) => return Err(self.reject_submission(SimulationError::from_submission(e))),
            Err(_) => return Err(self.reject_submission(SimulationError::SubmissionTimeout(timeout))),
        };

        self.inner.session().activate(simulation_id.clone());
        guard.armed = false;

        info!("Simulation {} started", simulation_id);
        self.inner.emit(CoordinatorEvent::Submitted {
            simulation_id: simulation_id.clone(),
        });
        self.start_polling(simulation_id.clone());

        Ok(simulation_id)
    }

    /// Stops the active simulation, if any, as a normal termination
    ///
    /// Returns false when there was nothing to cancel.
    pub async fn cancel(&self) -> bool {
        let Some(simulation_id) = self.active_simulation() else {
            return false;
        };

        let report = FinalReport::new(
            simulation_id.clone(),
            Severity::Info,
            "Simulation cancelled.",
            None,
        );
        self.inner.terminate(&simulation_id, report).await
    }

    /// Waits for the current polling task to exit
    pub async fn wait(&self) {
        let handle = self
            .poll_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Polling task failed: {}", e);
            }
        }
    }

    fn reject_submission(&self, error: SimulationError) -> SimulationError {
        self.inner.session().abort_submission();
        error!("{}", error);
        self.inner
            .emit(CoordinatorEvent::Finished(FinalReport::failure(None, error.clone())));
        error
    }

    fn start_polling(&self, simulation_id: SimulationId) {
        let poller = StatusPoller::new(Arc::clone(&self.inner), simulation_id);
        let handle = tokio::spawn(poller.run());

        // A replaced handle belongs to a finished job; its task exits on its own.
        self.poll_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
    }
}
