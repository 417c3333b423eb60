//! Fashion Pricing Optimizer CLI
//!
//! Command-line front end: submits simulations, follows their progress and
//! compares the GA and ACO results.

mod commands;
mod config;
mod render;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fashionopt")]
#[command(about = "Fashion Pricing Optimizer CLI", long_about = None)]
struct Cli {
    /// Pricing server URL
    #[arg(
        long,
        global = true,
        env = "FASHIONOPT_API_URL",
        default_value = "http://localhost:8080"
    )]
    api_url: String,

    /// Status polling interval in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fashionopt_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        poll_interval: cli.poll_interval_ms.map(Duration::from_millis),
    };

    handle_command(cli.command, &config).await
}
