//!
//! Flow Relay - webhook relay in front of upstream flow-execution endpoints
//!
//! Callers post `{"input": ...}` to one of the relay routes; the relay forwards
//! it to the configured flow, digs the answer out of the nested response and
//! returns `{"result": ...}`.

/// API module
pub mod api;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

/// Inbound payload module
pub mod payload;

/// Server module
pub mod server;

/// Session token module
pub mod session;

/// Upstream flow client module
pub mod upstream;

// Re-export key types
pub use config::{LogFormat, ServerConfig};
pub use error::{RelayError, RelayResult, ServerError, ServerResult};
pub use server::RelayServer;
pub use session::{SessionRefresher, SessionStore, SessionToken};
pub use upstream::{RelayTarget, UpstreamClient};

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let server = RelayServer::new(config)?;
    server.run().await
}

/// Initialize logging
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_logging(config: &ServerConfig) -> ServerResult<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // Create filter based on config
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ServerError::LoggingError(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
    };

    result.map_err(|e| ServerError::LoggingError(e.to_string()))
}
