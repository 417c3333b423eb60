//! Server configuration
//!
//! Bind address, upload location, optimizer commands and job housekeeping.

use std::path::PathBuf;
use std::time::Duration;

/// How to launch one optimizer: `<program> <script> <file> --flags...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerCommand {
    pub program: String,
    pub script: PathBuf,
}

impl OptimizerCommand {
    pub fn new(program: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Directory receiving uploaded product files, one subdirectory per job
    pub upload_dir: PathBuf,

    pub ga: OptimizerCommand,
    pub aco: OptimizerCommand,

    /// Optimizer processes allowed to run at the same time
    pub max_parallel_runs: usize,

    /// Age after which a job that was never cleaned up is discarded
    pub job_ttl: Duration,

    /// How often expired jobs are looked for
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            upload_dir: std::env::temp_dir().join("fashionopt"),
            ga: OptimizerCommand::new("python3", "GA.py"),
            aco: OptimizerCommand::new("python3", "ant.py"),
            max_parallel_runs: 2,
            job_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - FASHIONOPT_BIND_ADDR (default: 0.0.0.0:8080)
    /// - UPLOAD_DIR (default: <tmp>/fashionopt)
    /// - GA_PROGRAM / GA_SCRIPT (default: python3 GA.py)
    /// - ACO_PROGRAM / ACO_SCRIPT (default: python3 ant.py)
    /// - MAX_PARALLEL_RUNS (default: 2)
    /// - JOB_TTL_SECS (default: 3600)
    /// - SWEEP_INTERVAL_SECS (default: 60)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let command = |program_key: &str, script_key: &str, fallback: OptimizerCommand| {
            OptimizerCommand {
                program: var(program_key).unwrap_or(fallback.program),
                script: var(script_key).map(PathBuf::from).unwrap_or(fallback.script),
            }
        };

        let config = Self {
            bind_addr: var("FASHIONOPT_BIND_ADDR").unwrap_or(defaults.bind_addr),
            upload_dir: var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            ga: command("GA_PROGRAM", "GA_SCRIPT", defaults.ga),
            aco: command("ACO_PROGRAM", "ACO_SCRIPT", defaults.aco),
            max_parallel_runs: var("MAX_PARALLEL_RUNS")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.max_parallel_runs),
            job_ttl: var("JOB_TTL_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_ttl),
            sweep_interval: var("SWEEP_INTERVAL_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        for (name, command) in [("GA", &self.ga), ("ACO", &self.aco)] {
            if command.program.trim().is_empty() {
                anyhow::bail!("{} optimizer program cannot be empty", name);
            }
        }

        if self.max_parallel_runs == 0 {
            anyhow::bail!("max_parallel_runs must be greater than 0");
        }

        if self.job_ttl.is_zero() {
            anyhow::bail!("job_ttl must be greater than 0");
        }

        if self.sweep_interval.is_zero() {
            anyhow::bail!("sweep_interval must be greater than 0");
        }

        Ok(())
    }
}
