//! Status and cleanup command handlers

use anyhow::{Context, Result};
use colored::*;
use fashionopt_client::PricingClient;
use fashionopt_core::domain::simulation::SimulationId;
use fashionopt_core::lifecycle::{Observation, evaluate};

use crate::config::Config;
use crate::render;

/// Fetch and display the status of a simulation
pub async fn show_status(id: &str, config: &Config) -> Result<()> {
    let client = PricingClient::new(&config.api_url);
    let simulation_id = SimulationId::from(id);

    let status = client
        .get_status(&simulation_id)
        .await
        .with_context(|| format!("Failed to fetch status of simulation {}", id))?;

    render::print_status(&status);

    match evaluate(&status) {
        Observation::InProgress(snapshot) => {
            println!();
            println!("{}", snapshot.running_message().dimmed());
        }
        Observation::Terminal(outcome) => {
            println!();
            println!("{} {}", render::severity_tag(outcome.severity), outcome.message);
        }
    }

    Ok(())
}

/// Ask the server to forget a simulation
pub async fn cleanup(id: &str, config: &Config) -> Result<()> {
    let client = PricingClient::new(&config.api_url);

    client
        .cleanup_simulation(&SimulationId::from(id))
        .await
        .with_context(|| format!("Failed to clean up simulation {}", id))?;

    println!("{} Simulation {} cleaned up", "✓".green(), id.dimmed());
    Ok(())
}
