//! Simulate command handler
//!
//! Submits a simulation through the coordinator and follows it until its
//! final message arrives. Ctrl-C cancels the run and cleans it up.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use fashionopt_coordinator::{Coordinator, CoordinatorEvent, FinalReport};
use fashionopt_core::domain::simulation::Algorithm;
use fashionopt_core::dto::simulation::{ColumnMapping, SimulationParameters, SimulationSubmission};
use fashionopt_core::reconcile::reconcile_combined;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::Config;
use crate::render;

/// Arguments of `fashionopt simulate`
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Product file to upload
    pub file: PathBuf,

    #[arg(long)]
    pub production_budget: f64,
    #[arg(long)]
    pub marketing_budget: f64,
    #[arg(long)]
    pub logistics_budget: f64,
    /// Base discount percentage (0-100)
    #[arg(long)]
    pub discount_base: f64,
    /// Total shelf space available
    #[arg(long)]
    pub shelf_space: f64,
    #[arg(long, default_value_t = 8)]
    pub chromosome_bits: u32,

    #[command(flatten)]
    pub columns: ColumnArgs,
}

/// Which file column feeds each optimizer input
#[derive(Args, Debug)]
pub struct ColumnArgs {
    #[arg(long)]
    pub col_name: String,
    #[arg(long)]
    pub col_price: String,
    /// Production cost column
    #[arg(long)]
    pub col_cp: String,
    /// Marketing cost column
    #[arg(long)]
    pub col_cm: String,
    /// Logistics cost column
    #[arg(long)]
    pub col_cl: String,
    #[arg(long)]
    pub col_shelf_cost: String,
    #[arg(long)]
    pub col_age: String,
    #[arg(long)]
    pub col_stock: String,
    #[arg(long)]
    pub col_shelf: String,
    #[arg(long)]
    pub col_demand: String,
}

impl From<ColumnArgs> for ColumnMapping {
    fn from(args: ColumnArgs) -> Self {
        Self {
            name: args.col_name,
            price: args.col_price,
            production_cost: args.col_cp,
            marketing_cost: args.col_cm,
            logistics_cost: args.col_cl,
            shelf_cost: args.col_shelf_cost,
            age: args.col_age,
            stock: args.col_stock,
            shelf: args.col_shelf,
            demand: args.col_demand,
        }
    }
}

impl SimulateArgs {
    fn parameters(self) -> (PathBuf, SimulationParameters) {
        let parameters = SimulationParameters {
            production_budget: self.production_budget,
            marketing_budget: self.marketing_budget,
            logistics_budget: self.logistics_budget,
            discount_base: self.discount_base,
            shelf_space: self.shelf_space,
            chromosome_bits: self.chromosome_bits,
            columns: self.columns.into(),
        };
        (self.file, parameters)
    }
}

/// Run a simulation end to end
pub async fn run_simulation(args: SimulateArgs, config: &Config) -> Result<()> {
    let (file, parameters) = args.parameters();
    let submission = read_submission(&file, parameters).await?;

    let coordinator_config = config.coordinator_config()?;
    println!(
        "{} Submitting {} to {}",
        "▸".cyan(),
        submission.file_name.bold(),
        coordinator_config.api_url.dimmed()
    );

    let (coordinator, mut events) = Coordinator::connect(coordinator_config);

    // Failures here also arrive as a final message, handled below
    if let Err(e) = coordinator.start_simulation(submission).await {
        tracing::debug!("Submission failed: {}", e);
    }

    let followed = tokio::select! {
        report = follow(&mut events) => Some(report),
        _ = tokio::signal::ctrl_c() => None,
    };
    let report = match followed {
        Some(report) => report,
        None => {
            println!();
            println!("{}", "Cancelling simulation...".yellow());
            coordinator.cancel().await;
            follow(&mut events).await
        }
    };
    coordinator.wait().await;

    let Some(report) = report else {
        anyhow::bail!("Coordinator stopped without a final message");
    };

    render::print_final_report(&report);
    if let Some(result) = &report.result {
        let view = reconcile_combined(result);
        render::print_comparison(
            &view,
            result.result_or_empty(Algorithm::Genetic),
            result.result_or_empty(Algorithm::AntColony),
        );
    }

    if report.is_error() {
        anyhow::bail!("Simulation failed: {}", report.message);
    }
    Ok(())
}

async fn read_submission(file: &Path, parameters: SimulationParameters) -> Result<SimulationSubmission> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read product file {}", file.display()))?;

    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("products.xlsx")
        .to_string();

    Ok(SimulationSubmission::new(file_name, bytes, parameters))
}

/// Prints events until the final message, which is returned
async fn follow(events: &mut UnboundedReceiver<CoordinatorEvent>) -> Option<FinalReport> {
    while let Some(event) = events.recv().await {
        match event {
            CoordinatorEvent::Submitted { simulation_id } => {
                println!(
                    "{} Simulation {} started",
                    "✓".green(),
                    simulation_id.to_string().dimmed()
                );
            }
            CoordinatorEvent::Progress {
                snapshot, message, ..
            } => {
                println!("  {}  {}", render::progress_line(&snapshot), message.dimmed());
            }
            CoordinatorEvent::AlgorithmError { message, .. } => {
                println!("  {}", message.red());
            }
            CoordinatorEvent::Finished(report) => return Some(report),
        }
    }
    None
}
