//! Configuration for the flow relay
//!
//! Settings come from the process environment, optionally seeded from a
//! `.env` file in the working directory. Upstream URLs are never validated
//! here; an unset URL only fails when its route is called.
//!
//! Nothing is logged from this module since it runs before logging is set up.

use std::time::Duration;

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};
use crate::upstream::RelayTarget;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, multi-line output
    Pretty,
    /// One JSON object per line
    Json,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Primary flow endpoint (`LANGFLOW_URL`)
    #[serde(default)]
    pub langflow_url: Option<String>,

    /// Email flow endpoint (`LANGFLOW_URL_EMAIL`)
    #[serde(default)]
    pub langflow_url_email: Option<String>,

    /// Document flow endpoint (`LANGFLOW_URL_DOC`)
    #[serde(default)]
    pub langflow_url_doc: Option<String>,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub server_host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Log level, used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Timeout applied to every outbound upstream call
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// How often the session token is regenerated
    #[serde(default = "default_session_refresh")]
    pub session_refresh_secs: u64,

    /// Drop the `traceback` field from error bodies sent to callers
    #[serde(default)]
    pub hide_traceback: bool,

    /// Log full inbound and upstream payloads
    #[serde(default = "default_log_payloads")]
    pub log_payloads: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_upstream_timeout() -> u64 {
    35
}

fn default_session_refresh() -> u64 {
    3600 // 1 hour
}

fn default_log_payloads() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from `.env` (if present) and the process environment
    pub fn load() -> ServerResult<Self> {
        // Real environment variables take precedence over `.env`
        if let Err(e) = dotenv::dotenv() {
            if !e.not_found() {
                return Err(ServerError::ConfigError(format!("Failed to read .env: {}", e)));
            }
        }

        Self::from_environment(Environment::default())
    }

    /// Build configuration from an environment source
    ///
    /// Variable names map onto fields case-insensitively, so `LANGFLOW_URL`
    /// populates `langflow_url`.
    pub fn from_environment(environment: Environment) -> ServerResult<Self> {
        Config::builder()
            .add_source(environment.try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ServerError::ConfigError(e.to_string()))
    }

    /// Timeout for outbound upstream calls
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Interval between session token refreshes
    pub fn session_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.session_refresh_secs)
    }

    /// Socket address string to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// The three relay targets, in route order
    pub fn relay_targets(&self) -> [RelayTarget; 3] {
        let timeout = self.upstream_timeout();
        [
            RelayTarget::primary(self.langflow_url.clone(), timeout),
            RelayTarget::email(self.langflow_url_email.clone(), timeout),
            RelayTarget::document(self.langflow_url_doc.clone(), timeout),
        ]
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            langflow_url: None,
            langflow_url_email: None,
            langflow_url_doc: None,
            server_host: default_host(),
            server_port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            upstream_timeout_secs: default_upstream_timeout(),
            session_refresh_secs: default_session_refresh(),
            hide_traceback: false,
            log_payloads: default_log_payloads(),
        }
    }
}
