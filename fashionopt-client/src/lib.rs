//! Fashion Pricing Optimizer HTTP Client
//!
//! A small, typed client for the simulation endpoints of the pricing service.
//! The CLI and the coordinator both go through it, the coordinator via the
//! [`SimulationApi`] trait so it can run against an in-memory double in tests.
//!
//! # Example
//!
//! ```no_run
//! use fashionopt_client::PricingClient;
//! use fashionopt_core::domain::simulation::SimulationId;
//!
//! # async fn example() -> fashionopt_client::Result<()> {
//! let client = PricingClient::new("http://localhost:8080");
//! let status = client.get_status(&SimulationId::from("abc")).await?;
//! println!("{}", status.overall_status);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
mod simulations;

// Re-export commonly used types
pub use api::SimulationApi;
pub use error::{ClientError, Result};

use reqwest::Client;
use std::time::Duration;

/// Default bound on the submission request
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of payload characters kept in parse errors
pub const DEFAULT_PAYLOAD_DISPLAY_LIMIT: usize = 500;

/// HTTP client for the pricing service API
#[derive(Debug, Clone)]
pub struct PricingClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    submit_timeout: Duration,
    payload_display_limit: usize,
}

impl PricingClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use fashionopt_client::PricingClient;
    ///
    /// let client = PricingClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            payload_display_limit: DEFAULT_PAYLOAD_DISPLAY_LIMIT,
        }
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_payload_display_limit(mut self, limit: usize) -> Self {
        self.payload_display_limit = limit;
        self
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn submit_timeout(&self) -> Duration {
        self.submit_timeout
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Reads the body and turns a non-2xx response into an error
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::api_error(
                status.as_u16(),
                error_message_from_body(status.as_u16(), &body),
            ));
        }

        // A body cut short on a 2xx is a transport failure, not a bad payload
        Ok(response.text().await?)
    }
}

/// Extracts a readable message from an error response body
///
/// Prefers the JSON `message` or `error` field, then the raw text, then a
/// generic message naming the status code.
pub fn error_message_from_body(status: u16, body: &str) -> String {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(message)) = fields.get(key) {
                if !message.trim().is_empty() {
                    return message.clone();
                }
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("Server error: {}", status)
    } else {
        body.to_string()
    }
}

/// Shortens a raw payload to at most `limit` characters for display
pub fn truncate_payload(raw: &str, limit: usize) -> String {
    match raw.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &raw[..cut]),
        None => raw.to_string(),
    }
}
