//! Coordinator configuration
//!
//! Defines the connection and timing parameters of the polling client.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Coordinator configuration
///
/// All intervals are configurable so tests and slow deployments can tune them.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Pricing service base URL (e.g., "http://localhost:8080")
    pub api_url: String,

    /// Delay between two status requests
    pub poll_interval: Duration,

    /// Upper bound on the submission request
    pub submit_timeout: Duration,

    /// Consecutive transport failures tolerated before giving up (0 = none)
    pub status_retry_limit: u32,

    /// Characters of a raw payload kept in parse error messages
    pub payload_display_limit: usize,
}

impl CoordinatorConfig {
    /// Creates a new configuration with defaults
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            poll_interval: Duration::from_millis(1000),
            submit_timeout: Duration::from_secs(30),
            status_retry_limit: 0,
            payload_display_limit: 500,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - FASHIONOPT_API_URL (default: http://localhost:8080)
    /// - POLL_INTERVAL_MS (default: 1000)
    /// - SUBMIT_TIMEOUT_SECS (default: 30)
    /// - STATUS_RETRY_LIMIT (default: 0)
    /// - PAYLOAD_DISPLAY_LIMIT (default: 500)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let api_url = std::env::var("FASHIONOPT_API_URL").unwrap_or(defaults.api_url);

        let poll_interval = std::env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let submit_timeout = std::env::var("SUBMIT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.submit_timeout);

        let status_retry_limit = std::env::var("STATUS_RETRY_LIMIT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.status_retry_limit);

        let payload_display_limit = std::env::var("PAYLOAD_DISPLAY_LIMIT")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.payload_display_limit);

        let config = Self {
            api_url,
            poll_interval,
            submit_timeout,
            status_retry_limit,
            payload_display_limit,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn with_status_retry_limit(mut self, limit: u32) -> Self {
        self.status_retry_limit = limit;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.submit_timeout.is_zero() {
            anyhow::bail!("submit_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.submit_timeout, Duration::from_secs(30));
        assert_eq!(config.status_retry_limit, 0);
        assert_eq!(config.payload_display_limit, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CoordinatorConfig::default();

        // Invalid URL should fail
        config.api_url = "localhost:8080".to_string();
        assert!(config.validate().is_err());

        config.api_url = String::new();
        assert!(config.validate().is_err());

        config.api_url = "https://pricing.example.com".to_string();
        assert!(config.validate().is_ok());

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = CoordinatorConfig::default()
            .with_poll_interval(Duration::from_millis(250))
            .with_submit_timeout(Duration::from_secs(5))
            .with_status_retry_limit(3);

        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.submit_timeout, Duration::from_secs(5));
        assert_eq!(config.status_retry_limit, 3);
    }
}
