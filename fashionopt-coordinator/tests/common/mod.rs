//! Shared helpers for coordinator tests: an in-memory `SimulationApi` and
//! status builders.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use fashionopt_client::{ClientError, SimulationApi};
use fashionopt_coordinator::CoordinatorEvent;
use fashionopt_core::domain::result::{CombinedResult, OptimizationResult, ProductOutcome};
use fashionopt_core::domain::simulation::{OverallStatus, SimulationId, SimulationStatus};
use fashionopt_core::dto::simulation::{ColumnMapping, SimulationParameters, SimulationSubmission};

type StatusScript =
    Box<dyn Fn(&SimulationId, usize) -> fashionopt_client::Result<SimulationStatus> + Send + Sync>;

/// Scripted stand-in for the pricing service
///
/// The script receives the job ID and how many status requests were already
/// made for it.
pub struct FakeApi {
    script: StatusScript,
    ids: Mutex<VecDeque<&'static str>>,
    submit_delay: Duration,
    submit_error: Mutex<Option<ClientError>>,
    fetch_delays: HashMap<&'static str, Duration>,
    submits: AtomicUsize,
    fetches: Mutex<Vec<SimulationId>>,
    cleanups: Mutex<Vec<SimulationId>>,
}

impl FakeApi {
    pub fn new(
        script: impl Fn(&SimulationId, usize) -> fashionopt_client::Result<SimulationStatus>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            ids: Mutex::new(VecDeque::from(vec!["sim-a", "sim-b", "sim-c"])),
            submit_delay: Duration::ZERO,
            submit_error: Mutex::new(None),
            fetch_delays: HashMap::new(),
            submits: AtomicUsize::new(0),
            fetches: Mutex::new(Vec::new()),
            cleanups: Mutex::new(Vec::new()),
        }
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn with_submit_error(self, error: ClientError) -> Self {
        *self.submit_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_fetch_delay(mut self, id: &'static str, delay: Duration) -> Self {
        self.fetch_delays.insert(id, delay);
        self
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self, id: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.as_str() == id)
            .count()
    }

    pub fn cleanups(&self) -> Vec<SimulationId> {
        self.cleanups.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimulationApi for FakeApi {
    async fn submit(&self, _submission: &SimulationSubmission) -> fashionopt_client::Result<SimulationId> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        let error = self.submit_error.lock().unwrap().take();
        if let Some(error) = error {
            return Err(error);
        }

        let id = self.ids.lock().unwrap().pop_front().unwrap_or("sim-overflow");
        Ok(SimulationId::from(id))
    }

    async fn fetch_status(&self, simulation_id: &SimulationId) -> fashionopt_client::Result<SimulationStatus> {
        let attempt = {
            let mut fetches = self.fetches.lock().unwrap();
            let attempt = fetches.iter().filter(|f| *f == simulation_id).count();
            fetches.push(simulation_id.clone());
            attempt
        };

        if let Some(delay) = self.fetch_delays.get(simulation_id.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        (self.script)(simulation_id, attempt)
    }

    async fn cleanup(&self, simulation_id: &SimulationId) -> fashionopt_client::Result<()> {
        self.cleanups.lock().unwrap().push(simulation_id.clone());
        Ok(())
    }
}

pub fn submission() -> SimulationSubmission {
    let parameters = SimulationParameters {
        production_budget: 5000.0,
        marketing_budget: 1000.0,
        logistics_budget: 800.0,
        discount_base: 10.0,
        shelf_space: 300.0,
        chromosome_bits: 8,
        columns: ColumnMapping {
            name: "Name".to_string(),
            price: "Price".to_string(),
            production_cost: "Cp".to_string(),
            marketing_cost: "Cm".to_string(),
            logistics_cost: "Cl".to_string(),
            shelf_cost: "Cs".to_string(),
            age: "Age".to_string(),
            stock: "Stock".to_string(),
            shelf: "Shelf".to_string(),
            demand: "Demand".to_string(),
        },
    };
    SimulationSubmission::new("products.xlsx", b"name,price\nDress,50".to_vec(), parameters)
}

pub fn running(id: &SimulationId, ga_eta: f64, aco_eta: f64) -> SimulationStatus {
    let mut status = SimulationStatus::pending(id.clone());
    status.overall_status = OverallStatus::Running;
    status.ga_progress = Some(40.0);
    status.ga_estimated_time_remaining = Some(ga_eta);
    status.aco_progress = Some(20.0);
    status.aco_estimated_time_remaining = Some(aco_eta);
    status
}

pub fn finished(id: &SimulationId, overall_status: OverallStatus) -> SimulationStatus {
    let mut status = SimulationStatus::pending(id.clone());
    status.overall_status = overall_status;
    status.ga_progress = Some(100.0);
    status.aco_progress = Some(100.0);
    status.ga_finished = true;
    status.aco_finished = true;
    status
}

pub fn combined(ga_profit: f64, aco_profit: f64) -> CombinedResult {
    let result = |profit: f64| {
        OptimizationResult::new(
            profit,
            vec![ProductOutcome {
                name: "Dress".to_string(),
                quantity: 10,
                total_profit: profit,
                ..Default::default()
            }],
        )
    };
    CombinedResult::new(result(ga_profit), result(aco_profit))
}

pub fn completed(id: &SimulationId) -> SimulationStatus {
    let mut status = finished(id, OverallStatus::Completed);
    status.result = Some(combined(1000.0, 800.0));
    status
}

pub fn server_error(message: &str) -> ClientError {
    ClientError::api_error(500, message)
}

/// Everything the coordinator has sent so far
pub fn drain(events: &mut mpsc::UnboundedReceiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn finals(events: &[CoordinatorEvent]) -> Vec<&fashionopt_coordinator::FinalReport> {
    events
        .iter()
        .filter_map(|event| match event {
            CoordinatorEvent::Finished(report) => Some(report),
            _ => None,
        })
        .collect()
}
