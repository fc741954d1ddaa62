//! Client for the upstream flow-execution endpoints
//!
//! Each relay route is bound to one [`RelayTarget`]. A call sends
//! `{"input_value": ..}` (plus `session_id` for the primary target), waits at
//! most the target timeout, and pulls the answer out of
//! `outputs[0].outputs[0].results.message.text`.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, info_span, Instrument};

use crate::error::{RelayError, RelayResult, ServerResult};

/// Location of the answer inside a flow response
const RESULT_PATH: [PathSegment; 6] = [
    PathSegment::Key("outputs"),
    PathSegment::Index(0),
    PathSegment::Key("outputs"),
    PathSegment::Index(0),
    PathSegment::Key("results"),
    PathSegment::Key("message"),
];

/// Final field holding the text
const RESULT_FIELD: &str = "text";

#[derive(Debug, Clone, Copy)]
enum PathSegment {
    Key(&'static str),
    Index(usize),
}

/// One configured upstream flow endpoint
#[derive(Debug, Clone)]
pub struct RelayTarget {
    name: &'static str,
    route: &'static str,
    env_var: &'static str,
    url: Option<String>,
    timeout: Duration,
    attach_session: bool,
}

impl RelayTarget {
    /// Primary flow, the only one that receives the session id
    pub fn primary(url: Option<String>, timeout: Duration) -> Self {
        Self {
            name: "primary",
            route: "/runLangFlow",
            env_var: "LANGFLOW_URL",
            url,
            timeout,
            attach_session: true,
        }
    }

    /// Email flow
    pub fn email(url: Option<String>, timeout: Duration) -> Self {
        Self {
            name: "email",
            route: "/runLangFlowEmail",
            env_var: "LANGFLOW_URL_EMAIL",
            url,
            timeout,
            attach_session: false,
        }
    }

    /// Document flow
    pub fn document(url: Option<String>, timeout: Duration) -> Self {
        Self {
            name: "document",
            route: "/runLangFlowDoc",
            env_var: "LANGFLOW_URL_DOC",
            url,
            timeout,
            attach_session: false,
        }
    }

    /// Short label used in logs and spans
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Webhook path this target is mounted on
    pub fn route(&self) -> &'static str {
        self.route
    }

    /// Environment variable holding the URL
    pub fn env_var(&self) -> &'static str {
        self.env_var
    }

    /// Configured URL, `None` when unset or blank
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Upper bound on one outbound call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether outbound calls carry the session id
    pub fn attach_session(&self) -> bool {
        self.attach_session
    }
}

/// Body sent to a flow endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRequest {
    /// Caller's `input`, or the default
    pub input_value: String,
    /// Current session token, primary target only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Shared HTTP client for all relay targets
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    log_payloads: bool,
}

impl UpstreamClient {
    /// Create a new client; connections are pooled across requests
    pub fn new(log_payloads: bool) -> ServerResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            log_payloads,
        })
    }

    /// Run a flow once and return the text it produced
    pub async fn run_flow(&self, target: &RelayTarget, request: &FlowRequest) -> RelayResult<String> {
        let url = target.url().ok_or(RelayError::MissingUpstream {
            route: target.route(),
            env_var: target.env_var(),
        })?;

        let span = info_span!("run_flow", target = target.name(), %url);
        async move {
            debug!(session = request.session_id.is_some(), "Calling flow endpoint");

            let response = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .timeout(target.timeout())
                .json(request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(RelayError::UpstreamStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            let body = response.text().await?;
            let result: Value = serde_json::from_str(&body).map_err(|e| {
                RelayError::UnexpectedShape(format!("upstream response is not valid JSON: {}", e))
            })?;

            if self.log_payloads {
                info!(result = %result, "Flow result");
            } else {
                debug!(status = status.as_u16(), bytes = body.len(), "Flow responded");
            }

            extract_result_text(&result)
        }
        .instrument(span)
        .await
    }
}

/// Pull `outputs[0].outputs[0].results.message.text` out of a flow response
pub fn extract_result_text(response: &Value) -> RelayResult<String> {
    let mut current = response;
    let mut walked = String::new();

    for segment in RESULT_PATH {
        let next = match segment {
            PathSegment::Key(key) => {
                if !walked.is_empty() {
                    walked.push('.');
                }
                walked.push_str(key);
                current.get(key)
            }
            PathSegment::Index(index) => {
                walked.push_str(&format!("[{}]", index));
                current.get(index)
            }
        };
        current = next.ok_or_else(|| {
            RelayError::UnexpectedShape(format!("upstream response has no '{}'", walked))
        })?;
    }

    match current.get(RESULT_FIELD) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(RelayError::UnexpectedShape(format!(
            "upstream response field '{}.{}' is not a string: {}",
            walked, RESULT_FIELD, other
        ))),
        None => Err(RelayError::UnexpectedShape(format!(
            "upstream response has no '{}.{}'",
            walked, RESULT_FIELD
        ))),
    }
}
