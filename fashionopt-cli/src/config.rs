//! Configuration module
//!
//! CLI settings and the coordinator configuration derived from them.

use anyhow::{Context, Result};
use fashionopt_coordinator::CoordinatorConfig;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the pricing server
    pub api_url: String,

    /// Overrides the coordinator's polling interval
    pub poll_interval: Option<Duration>,
}

impl Config {
    /// Coordinator settings: environment defaults, then CLI overrides
    pub fn coordinator_config(&self) -> Result<CoordinatorConfig> {
        let mut config = CoordinatorConfig::from_env().context("Invalid coordinator configuration")?;
        config.api_url = self.api_url.clone();
        if let Some(interval) = self.poll_interval {
            config = config.with_poll_interval(interval);
        }

        config.validate()?;
        Ok(config)
    }
}
