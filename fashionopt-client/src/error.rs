//! Error types for the pricing client

use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the pricing service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The request did not complete in time
    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// API returned an error status code
    #[error("{message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// The simulation is unknown to the server
    #[error("Simulation ID {0} expired or not found.")]
    NotFound(String),

    /// The status payload could not be decoded
    #[error("Failed to parse status response: {detail}. Raw response: {payload}")]
    MalformedStatus {
        detail: String,
        /// Raw payload, truncated for display
        payload: String,
    },

    /// The status payload named a status outside the known set
    #[error("Unrecognized simulation status '{0}'")]
    UnknownStatus(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Classifies a transport error, keeping timeouts distinct
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::RequestFailed(err)
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Whether the response body was unusable (malformed or unknown status)
    pub fn is_payload_error(&self) -> bool {
        matches!(self, Self::MalformedStatus { .. } | Self::UnknownStatus(_))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
