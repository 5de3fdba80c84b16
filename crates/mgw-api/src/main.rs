//! # mgw-api: Binary Entry Point
//!
//! Loads the gateway configuration named by `MGW_CONFIG` and serves it on
//! `PORT` (default 8080).

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use mgw_api::state::{AppConfig, AppState};
use mgw_synth::Gateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let gateway = Gateway::load(&config.config_path).map_err(|e| {
        tracing::error!("configuration rejected: {e}");
        e
    })?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("installing Prometheus recorder")?;
    let state = AppState::new(gateway).with_metrics(handle);

    let app = mgw_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("mock gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
