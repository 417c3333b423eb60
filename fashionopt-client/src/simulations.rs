//! Simulation API endpoints

use crate::error::{ClientError, Result};
use crate::{PricingClient, truncate_payload};
use fashionopt_core::domain::simulation::{SimulationId, SimulationStatus, StatusParseError};
use fashionopt_core::dto::simulation::SimulationSubmission;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tracing::debug;

impl PricingClient {
    // =============================================================================
    // Simulation Lifecycle
    // =============================================================================

    /// Submit a new simulation
    ///
    /// Uploads the product file together with the numeric parameters and the
    /// column mapping as one multipart request, bounded by the configured
    /// submission timeout.
    ///
    /// # Returns
    /// The job ID minted by the server
    pub async fn submit_simulation(&self, submission: &SimulationSubmission) -> Result<SimulationId> {
        let url = format!("{}/api/simulate", self.base_url);

        let file = Part::bytes(submission.file.clone()).file_name(submission.file_name.clone());
        let form = submission
            .parameters
            .to_form_fields()
            .into_iter()
            .fold(Form::new().part("file", file), |form, (field, value)| {
                form.text(field, value)
            });

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.submit_timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_transport(e, self.submit_timeout))?;

        let status = response.status();
        let body = self.handle_text_response(response).await?;
        let id = body.trim();
        if id.is_empty() {
            return Err(ClientError::api_error(
                status.as_u16(),
                "Server returned an empty simulation ID.",
            ));
        }

        Ok(SimulationId::from(id))
    }

    /// Get the status of a simulation
    ///
    /// # Returns
    /// The decoded status, `NotFound` on 404, or a payload error carrying the
    /// parse detail and the truncated raw body
    pub async fn get_status(&self, simulation_id: &SimulationId) -> Result<SimulationStatus> {
        let url = format!("{}/api/simulate/status/{}", self.base_url, simulation_id);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(simulation_id.to_string()));
        }

        let body = self.handle_text_response(response).await?;
        debug!(
            "Status payload for {}: {}",
            simulation_id,
            truncate_payload(&body, self.payload_display_limit)
        );

        self.parse_status(&body)
    }

    /// Discard a simulation on the server
    pub async fn cleanup_simulation(&self, simulation_id: &SimulationId) -> Result<()> {
        let url = format!("{}/api/simulate/cleanup/{}", self.base_url, simulation_id);
        let response = self.client.post(&url).send().await?;

        self.handle_text_response(response).await.map(|_| ())
    }

    fn parse_status(&self, body: &str) -> Result<SimulationStatus> {
        SimulationStatus::from_json(body).map_err(|err| match err {
            StatusParseError::UnknownStatus(status) => ClientError::UnknownStatus(status),
            StatusParseError::Malformed(e) => ClientError::MalformedStatus {
                detail: e.to_string(),
                payload: truncate_payload(body, self.payload_display_limit),
            },
        })
    }
}
