use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fashionopt_server::api;
use fashionopt_server::config::ServerConfig;
use fashionopt_server::service::simulation_service;
use fashionopt_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fashionopt_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fashion Pricing Optimizer server...");

    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.upload_dir.display()))?;

    tracing::info!(
        "Optimizers: GA = {} {}, ACO = {} {} (max {} parallel runs)",
        config.ga.program,
        config.ga.script.display(),
        config.aco.program,
        config.aco.script.display(),
        config.max_parallel_runs
    );

    let state = AppState::new(&config);
    let _sweeper =
        simulation_service::spawn_expiry_sweeper(state.clone(), config.job_ttl, config.sweep_interval);

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
