//! # Claims Dashboard Server
//!
//! Loads layered configuration, wires the analytics, advisor and email
//! collaborators and serves the dashboard until Ctrl-C.

use anyhow::{anyhow, Context, Result};
use tracing::info;

use claims_dashboard::{routes, AppState, DashboardConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with environment filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("claims_dashboard=info".parse()?),
        )
        .init();

    info!("🌟 Starting Claims Dashboard");

    let config = DashboardConfig::from_env().context("Failed to load dashboard configuration")?;
    config
        .validate()
        .map_err(|e| anyhow!(e))
        .context("Invalid dashboard configuration")?;
    let addr = config.socket_addr().map_err(|e| anyhow!(e))?;

    info!("Configuration:");
    info!("  Listen address: {}", addr);
    info!(
        "  Alert threshold: {} EUR (range {}..={})",
        config.analysis.threshold.default, config.analysis.threshold.min, config.analysis.threshold.max
    );
    info!("  Max upload: {} bytes, {} rows", config.analysis.max_upload_bytes, config.analysis.max_rows);

    let state = AppState::from_config(config).context("Failed to initialise dashboard state")?;

    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("🛑 Received shutdown signal");
            }
        })
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🎯 Dashboard ready on http://{}", bound);
    server.await;

    info!("👋 Claims Dashboard shutdown complete");
    Ok(())
}
