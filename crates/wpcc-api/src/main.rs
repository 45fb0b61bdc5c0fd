//! Binary entrypoint for the WPCC API server.
use tracing_subscriber::EnvFilter;
use wpcc_api::{run, ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ApiConfig::from_env()?;
    tracing::debug!(?config, "configuration loaded");
    run(config).await
}
