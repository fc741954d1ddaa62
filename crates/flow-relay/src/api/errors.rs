//! Error envelope returned by the webhook routes
//!
//! Failures never change the HTTP status: callers get a 200 with
//! `{"error result": "Error: ...", "traceback": "..."}` and the same trace is
//! written to the server log.

use std::error::Error as StdError;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::RelayError;

/// JSON body sent when a route fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    /// `Error: <message>`
    #[serde(rename = "error result")]
    pub error_result: String,

    /// Rendered cause chain, omitted when tracebacks are hidden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Turns relay errors into envelopes
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorFormatter {
    hide_traceback: bool,
}

impl ErrorFormatter {
    pub fn new(hide_traceback: bool) -> Self {
        Self { hide_traceback }
    }

    /// Log `err` and build the envelope for `route`
    pub fn envelope(&self, route: &str, err: &RelayError) -> ErrorEnvelope {
        let message = format!("Error: {}", err);
        let traceback = render_traceback(err);

        error!(
            route,
            kind = err.kind(),
            upstream = err.is_upstream_error(),
            "{}\n{}",
            message,
            traceback
        );

        ErrorEnvelope {
            error_result: message,
            traceback: (!self.hide_traceback).then_some(traceback),
        }
    }
}

/// Render an error and its sources, one per line
pub fn render_traceback(err: &RelayError) -> String {
    let mut lines = vec![format!("{}: {}", err.kind(), err)];
    let mut last = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        if text != last {
            lines.push(format!("Caused by: {}", text));
            last = text;
        }
        source = cause.source();
    }

    lines.join("\n")
}
