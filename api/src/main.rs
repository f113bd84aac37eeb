use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use api::{
    build_router, config::ApiConfig, observability::Observability, state::AppState,
    upstream::HttpFetcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let obs = Observability::init()?;
    let config = ApiConfig::from_env().context("invalid configuration")?;

    let fetcher = HttpFetcher::new(config.fetch_timeout).context("failed to build HTTP client")?;
    let addr = config.bind_address();
    let state = AppState::new(config, Arc::new(fetcher), obs.registry);

    let app = build_router(state);

    tracing::info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Observability::shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
