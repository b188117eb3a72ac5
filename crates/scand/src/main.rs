//! scand - Wi-Fi scan scheduling daemon
//!
//! Runs a scan engine per radio and serves the scan API alongside
//! health and metrics endpoints.

use anyhow::Result;
use scand::{api, config::DaemonConfig, daemon::Daemon};
use scan_engine::{HealthRegistry, ScanMetrics};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DAEMON_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(event = "startup", version = DAEMON_VERSION, "Starting scand");

    let config = DaemonConfig::load()?;
    info!(
        node_name = %config.node_name,
        api_port = config.api_port,
        interfaces = config.effective_interfaces().len(),
        "Daemon configured"
    );

    // Register metrics before the first scrape
    let _metrics = ScanMetrics::new();

    let health_registry = HealthRegistry::new();
    let daemon = Daemon::start(&config, health_registry.clone()).await?;

    let app_state = Arc::new(api::AppState::new(
        daemon.registry.clone(),
        daemon.offloads.clone(),
        health_registry.clone(),
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!(event = "shutdown", reason = "SIGINT received", "Shutting down");
        }
        result = api_handle => {
            match result {
                Ok(Ok(())) => info!(event = "shutdown", reason = "API server exited", "Shutting down"),
                Ok(Err(e)) => error!(error = %e, "API server failed"),
                Err(e) => error!(error = %e, "API server task panicked"),
            }
        }
    }

    health_registry.set_ready(false).await;
    daemon.shutdown().await;

    Ok(())
}
