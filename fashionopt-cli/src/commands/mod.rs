//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod compare;
mod simulate;
mod status;

pub use simulate::SimulateArgs;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a simulation and follow it to the end
    Simulate(SimulateArgs),
    /// Show the current status of a simulation
    Status {
        /// Simulation ID
        id: String,
    },
    /// Ask the server to forget a simulation
    Cleanup {
        /// Simulation ID
        id: String,
    },
    /// Compare two saved optimizer results
    Compare {
        /// GA result (JSON)
        ga: PathBuf,
        /// ACO result (JSON)
        aco: PathBuf,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Simulate(args) => simulate::run_simulation(args, config).await,
        Commands::Status { id } => status::show_status(&id, config).await,
        Commands::Cleanup { id } => status::cleanup(&id, config).await,
        Commands::Compare { ga, aco } => compare::compare_files(&ga, &aco).await,
    }
}
