//! Error types for the flow relay
//!
//! `ServerError` covers process-level failures (configuration, binding).
//! `RelayError` covers everything that can go wrong while handling a single
//! webhook call; the route layer turns every `RelayError` into an error
//! envelope instead of propagating it.

use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    ClientError(#[from] reqwest::Error),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    LoggingError(String),

    /// IO error while binding or serving
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Failure while relaying one request
#[derive(Error, Debug)]
pub enum RelayError {
    /// Inbound body is not a JSON object
    #[error("{0}")]
    MalformedPayload(String),

    /// Target URL was never configured
    #[error("upstream URL for {route} is not configured (set {env_var})")]
    MissingUpstream {
        /// Route that was called
        route: &'static str,
        /// Environment variable that should hold the URL
        env_var: &'static str,
    },

    /// Timeout, refused connection, DNS failure and friends
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("upstream returned status {status} for url '{url}'")]
    UpstreamStatus {
        /// HTTP status code
        status: u16,
        /// Upstream URL
        url: String,
    },

    /// Upstream body did not contain the expected result
    #[error("{0}")]
    UnexpectedShape(String),
}

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    /// Short variant name, used as the first line of the rendered trace
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MalformedPayload(_) => "MalformedPayload",
            RelayError::MissingUpstream { .. } => "MissingUpstream",
            RelayError::Transport(_) => "Transport",
            RelayError::UpstreamStatus { .. } => "UpstreamStatus",
            RelayError::UnexpectedShape(_) => "UnexpectedShape",
        }
    }

    /// Check if the error came from the outbound call itself
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            RelayError::Transport(_) | RelayError::UpstreamStatus { .. } | RelayError::UnexpectedShape(_)
        )
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::MalformedPayload(format!("Invalid JSON body: {}", err))
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err)
    }
}
