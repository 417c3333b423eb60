//! Abstraction over the simulation endpoints

use async_trait::async_trait;
use fashionopt_core::domain::simulation::{SimulationId, SimulationStatus};
use fashionopt_core::dto::simulation::SimulationSubmission;

use crate::PricingClient;
use crate::error::Result;

/// The three calls a coordinator needs from the pricing service
#[async_trait]
pub trait SimulationApi: Send + Sync {
    /// Uploads the product file and parameters, returning the new job ID
    async fn submit(&self, submission: &SimulationSubmission) -> Result<SimulationId>;

    /// Fetches the current status of a job
    ///
    /// Unknown jobs yield [`crate::ClientError::NotFound`]; undecodable
    /// payloads yield `MalformedStatus` or `UnknownStatus`.
    async fn fetch_status(&self, simulation_id: &SimulationId) -> Result<SimulationStatus>;

    /// Asks the server to discard a job
    async fn cleanup(&self, simulation_id: &SimulationId) -> Result<()>;
}

#[async_trait]
impl SimulationApi for PricingClient {
    async fn submit(&self, submission: &SimulationSubmission) -> Result<SimulationId> {
        self.submit_simulation(submission).await
    }

    async fn fetch_status(&self, simulation_id: &SimulationId) -> Result<SimulationStatus> {
        self.get_status(simulation_id).await
    }

    async fn cleanup(&self, simulation_id: &SimulationId) -> Result<()> {
        self.cleanup_simulation(simulation_id).await
    }
}
