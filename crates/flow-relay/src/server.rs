//! Relay server lifecycle
//!
//! Owns the session token for the life of the process: the refresher starts
//! with the listener and is cancelled and awaited once the HTTP server has
//! drained.

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{self, AppState, ErrorFormatter};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::session::{SessionRefresher, SessionStore};
use crate::upstream::UpstreamClient;

/// Main server implementation
#[derive(Debug, Clone)]
pub struct RelayServer {
    /// Configuration
    pub config: ServerConfig,

    /// Handler state
    state: AppState,
}

impl RelayServer {
    /// Create a new server; generates the initial session token
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        if config.session_refresh_secs == 0 {
            return Err(ServerError::ConfigError(
                "SESSION_REFRESH_SECS must be greater than zero".to_string(),
            ));
        }

        for target in config.relay_targets() {
            if target.url().is_none() {
                warn!(
                    "{} is not set - {} will fail until it is configured",
                    target.env_var(),
                    target.route()
                );
            }
        }

        let state = AppState {
            upstream: UpstreamClient::new(config.log_payloads)?,
            session: SessionStore::new(),
            errors: ErrorFormatter::new(config.hide_traceback),
            log_payloads: config.log_payloads,
        };

        Ok(Self { config, state })
    }

    /// Session token holder used by the primary relay
    pub fn session(&self) -> &SessionStore {
        &self.state.session
    }

    /// Router with every endpoint mounted
    pub fn router(&self) -> Router {
        api::build_router(self.state.clone(), self.config.relay_targets())
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM
    pub async fn run(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let refresher = SessionRefresher::spawn(
            self.state.session.clone(),
            self.config.session_refresh_interval(),
        );

        let app = self.router();
        info!("Listening on {}", listener.local_addr()?);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        info!("HTTP server stopped, stopping session refresher");
        refresher.shutdown().await;

        served?;
        info!("Shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
