//! Optimizer Service
//!
//! Runs the GA and ACO optimizers as child processes and feeds what they print
//! into the job store.
//!
//! Each optimizer is started as `<program> <script> <file> --flags...`. While it
//! runs, stdout lines of the form
//! `[PROGRESS] GA: 42.5% completed, estimated 12.0s remaining` update the job's
//! progress. The last stdout line that is a JSON object is the final output:
//! either a result (`total_profit`, `products`) or an `error`, optionally
//! qualified by `error_kind` (`shelf_space` or `validation`).

use fashionopt_core::domain::result::{OptimizationResult, ProductOutcome};
use fashionopt_core::domain::simulation::{Algorithm, SimulationId};
use fashionopt_core::dto::simulation::SimulationParameters;
use fashionopt_core::lifecycle::JobEvent;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;

use crate::config::{OptimizerCommand, ServerConfig};
use crate::repository::simulation_repository;
use crate::store::SimulationStore;

const TRACEBACK_MARKER: &str = "Traceback";

/// What an optimizer run amounted to
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerOutput {
    Result(OptimizationResult),
    Failed(String),
    ShelfSpaceExceeded { required: f64, available: f64 },
    ValidationFailed(String),
}

impl OptimizerOutput {
    /// Lifecycle event recording this output for `algorithm`
    pub fn into_event(self, algorithm: Algorithm) -> JobEvent {
        match self {
            OptimizerOutput::Result(result) => JobEvent::Finished { algorithm, result },
            OptimizerOutput::Failed(message) => JobEvent::Failed { algorithm, message },
            OptimizerOutput::ShelfSpaceExceeded {
                required,
                available,
            } => JobEvent::ShelfSpaceExceeded {
                required,
                available,
            },
            OptimizerOutput::ValidationFailed(message) => JobEvent::ValidationFailed { message },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(default)]
    total_profit: Option<f64>,
    #[serde(default)]
    products: Vec<RawProduct>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_kind: Option<String>,
    #[serde(default)]
    required_shelf_space: Option<f64>,
    #[serde(default)]
    available_shelf_space: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    #[serde(default)]
    name: String,
    #[serde(default)]
    quantity: f64,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    unit_cost: f64,
    #[serde(default)]
    profit_per_unit: f64,
    #[serde(default)]
    total_profit: f64,
    #[serde(default)]
    total_cost: f64,
}

impl From<RawProduct> for ProductOutcome {
    fn from(raw: RawProduct) -> Self {
        Self {
            name: raw.name,
            quantity: raw.quantity.round().max(0.0) as u32,
            price: raw.price,
            unit_cost: raw.unit_cost,
            profit_per_unit: raw.profit_per_unit,
            total_profit: raw.total_profit,
            total_cost: raw.total_cost,
        }
    }
}

/// Parses a progress line printed by `algorithm`
///
/// Returns `(progress, estimated_seconds_remaining)`.
pub fn parse_progress(line: &str, algorithm: Algorithm) -> Option<(f64, f64)> {
    let marker = format!("[PROGRESS] {}: ", algorithm.code());
    let start = line.find(&marker)? + marker.len();
    let (progress, rest) = line[start..].split_once("% completed, estimated ")?;
    let (eta, _) = rest.split_once("s remaining")?;

    let progress = progress.trim().parse::<f64>().ok()?;
    let eta = eta.trim().parse::<f64>().ok()?;
    Some((progress, eta))
}

fn looks_like_json_object(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('{') && line.ends_with('}')
}

/// Decides the outcome of a finished optimizer process
///
/// `exit_code` is `None` when the process was killed by a signal.
pub fn interpret_output(
    exit_code: Option<i32>,
    last_json: Option<&str>,
    traceback: bool,
) -> OptimizerOutput {
    let json = match (exit_code, last_json) {
        (Some(0), Some(json)) => json,
        (code, json) => {
            let mut message = format!(
                "Optimizer script failed with exit code {}.",
                code.unwrap_or(-1)
            );
            if json.is_none() {
                message.push_str(" No valid JSON output found.");
            } else if traceback {
                message.push_str(" Optimizer script encountered an unhandled error (traceback detected).");
            }
            return OptimizerOutput::Failed(message);
        }
    };

    let raw: RawOutput = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(err) => {
            return OptimizerOutput::Failed(format!(
                "Failed to parse JSON output from optimizer. Error: {}",
                err
            ));
        }
    };

    if let Some(error) = raw.error {
        return match raw.error_kind.as_deref() {
            Some("shelf_space") => OptimizerOutput::ShelfSpaceExceeded {
                required: raw.required_shelf_space.unwrap_or(0.0),
                available: raw.available_shelf_space.unwrap_or(0.0),
            },
            Some("validation") => OptimizerOutput::ValidationFailed(error),
            _ => OptimizerOutput::Failed(error),
        };
    }

    let products = raw.products.into_iter().map(ProductOutcome::from).collect();
    OptimizerOutput::Result(OptimizationResult::new(
        raw.total_profit.unwrap_or(0.0),
        products,
    ))
}

/// Command-line flags passed to both optimizers
pub fn optimizer_args(params: &SimulationParameters) -> Vec<String> {
    let columns = &params.columns;
    let mut args = vec![
        "--bp".to_string(),
        params.production_budget.to_string(),
        "--bm".to_string(),
        params.marketing_budget.to_string(),
        "--bl".to_string(),
        params.logistics_budget.to_string(),
        "--s_max".to_string(),
        params.shelf_space.to_string(),
        "--d_base".to_string(),
        params.discount_base.to_string(),
        "--chromosome_bits".to_string(),
        params.chromosome_bits.to_string(),
    ];

    let column_flags = [
        ("--col_name", &columns.name),
        ("--col_price", &columns.price),
        ("--col_cp", &columns.production_cost),
        ("--col_cm", &columns.marketing_cost),
        ("--col_cl", &columns.logistics_cost),
        ("--col_shelf_cost", &columns.shelf_cost),
        ("--col_age", &columns.age),
        ("--col_stock", &columns.stock),
        ("--col_shelf", &columns.shelf),
        ("--col_demand", &columns.demand),
    ];
    for (flag, column) in column_flags {
        args.push(flag.to_string());
        args.push(column.clone());
    }

    args
}

/// Launches optimizer processes under a bounded number of permits
pub struct OptimizerRunner {
    ga: OptimizerCommand,
    aco: OptimizerCommand,
    permits: Arc<Semaphore>,
    store: SimulationStore,
    running: Mutex<HashMap<SimulationId, Vec<AbortHandle>>>,
}

impl OptimizerRunner {
    pub fn new(config: &ServerConfig, store: SimulationStore) -> Self {
        Self {
            ga: config.ga.clone(),
            aco: config.aco.clone(),
            permits: Arc::new(Semaphore::new(config.max_parallel_runs)),
            store,
            running: Mutex::new(HashMap::new()),
        }
    }

    fn command(&self, algorithm: Algorithm) -> &OptimizerCommand {
        match algorithm {
            Algorithm::Genetic => &self.ga,
            Algorithm::AntColony => &self.aco,
        }
    }

    /// Starts both optimizers for a job
    pub fn spawn(&self, simulation_id: &SimulationId, file: &Path, params: &SimulationParameters) {
        let args = optimizer_args(params);
        let mut handles = Vec::with_capacity(Algorithm::ALL.len());

        for algorithm in Algorithm::ALL {
            let command = self.command(algorithm).clone();
            let permits = Arc::clone(&self.permits);
            let store = self.store.clone();
            let simulation_id = simulation_id.clone();
            let file = file.to_path_buf();
            let args = args.clone();

            let task = tokio::spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };

                tracing::info!("Starting {} optimizer for simulation {}", algorithm, simulation_id);
                let output =
                    run_optimizer(&command, algorithm, &simulation_id, &file, &args, &store).await;

                if let OptimizerOutput::Failed(message) = &output {
                    tracing::error!(
                        "{} optimizer failed for simulation {}: {}",
                        algorithm,
                        simulation_id,
                        message
                    );
                } else {
                    tracing::info!("{} optimizer finished for simulation {}", algorithm, simulation_id);
                }

                simulation_repository::apply(&store, &simulation_id, output.into_event(algorithm));
            });
            handles.push(task.abort_handle());
        }

        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(simulation_id.clone(), handles);
    }

    /// Stops any optimizer still running for a job
    ///
    /// Aborting the task drops the child process handle, which kills it.
    pub fn cancel(&self, simulation_id: &SimulationId) {
        let handles = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(simulation_id);

        if let Some(handles) = handles {
            let live = handles.iter().filter(|h| !h.is_finished()).count();
            if live > 0 {
                tracing::info!("Stopping {} optimizer run(s) for simulation {}", live, simulation_id);
            }
            for handle in handles {
                handle.abort();
            }
        }
    }
}

async fn run_optimizer(
    command: &OptimizerCommand,
    algorithm: Algorithm,
    simulation_id: &SimulationId,
    file: &Path,
    args: &[String],
    store: &SimulationStore,
) -> OptimizerOutput {
    let spawned = Command::new(&command.program)
        .arg(&command.script)
        .arg(file)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(err) => {
            return OptimizerOutput::Failed(format!(
                "Failed to start optimizer '{}': {}",
                command.program, err
            ));
        }
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return OptimizerOutput::Failed("Optimizer output could not be captured.".to_string());
    };

    let ((last_json, stdout_traceback), stderr_text) = tokio::join!(
        read_stdout(stdout, algorithm, simulation_id, store),
        collect_stderr(stderr),
    );

    let exit_code = match child.wait().await {
        Ok(status) => status.code(),
        Err(err) => {
            return OptimizerOutput::Failed(format!("Failed to wait for optimizer: {}", err));
        }
    };

    tracing::info!(
        "{} optimizer for simulation {} exited with code {:?}",
        algorithm,
        simulation_id,
        exit_code
    );
    if !stderr_text.is_empty() {
        tracing::debug!("{} optimizer stderr:\n{}", algorithm, stderr_text);
    }

    let traceback = stdout_traceback || stderr_text.contains(TRACEBACK_MARKER);
    interpret_output(exit_code, last_json.as_deref(), traceback)
}

/// Applies progress lines as they arrive and keeps the last JSON line
async fn read_stdout(
    stdout: impl AsyncRead + Unpin,
    algorithm: Algorithm,
    simulation_id: &SimulationId,
    store: &SimulationStore,
) -> (Option<String>, bool) {
    let mut lines = BufReader::new(stdout).lines();
    let mut last_json = None;
    let mut traceback = false;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!("Failed to read {} optimizer output: {}", algorithm, err);
                break;
            }
        };
        tracing::debug!("{} output: {}", algorithm, line);

        if let Some((progress, eta)) = parse_progress(&line, algorithm) {
            simulation_repository::update_progress(store, simulation_id, algorithm, progress, eta);
        } else if looks_like_json_object(&line) {
            last_json = Some(line.trim().to_string());
        } else if line.contains(TRACEBACK_MARKER) {
            traceback = true;
        }
    }

    (last_json, traceback)
}

async fn collect_stderr(stream: impl AsyncRead + Unpin) -> String {
    let mut text = String::new();
    let mut reader = BufReader::new(stream);
    if let Err(err) = reader.read_to_string(&mut text).await {
        tracing::warn!("Failed to read optimizer stderr: {}", err);
    }
    text
}
