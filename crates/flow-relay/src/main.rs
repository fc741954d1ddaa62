use anyhow::{Context, Result};
use flow_relay::ServerConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from .env and environment variables
    let config = ServerConfig::load().context("Failed to load configuration")?;

    flow_relay::init_logging(&config).context("Failed to initialize logging")?;
    info!(
        bind_address = %config.bind_address(),
        upstream_timeout_secs = config.upstream_timeout_secs,
        session_refresh_secs = config.session_refresh_secs,
        "Starting flow relay"
    );

    // Run the server using the library's run function
    flow_relay::run(config).await.context("Server error")?;

    Ok(())
}
