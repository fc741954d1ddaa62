//! Flow relay handler, shared by all relay routes

use axum::{
    body::Bytes,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use super::AppState;
use crate::error::RelayResult;
use crate::payload::InboundPayload;
use crate::upstream::{FlowRequest, RelayTarget};

/// Successful relay body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayResponse {
    pub result: String,
}

/// Forward `body` to `target` and reshape the answer
pub async fn handle_relay(state: AppState, target: &RelayTarget, body: Bytes) -> Response {
    match relay(&state, target, &body).await {
        Ok(result) => {
            info!(route = target.route(), "Flow run succeeded");
            Json(RelayResponse { result }).into_response()
        }
        Err(err) => state.errors.envelope(target.route(), &err).into_response(),
    }
}

async fn relay(state: &AppState, target: &RelayTarget, body: &[u8]) -> RelayResult<String> {
    let payload = InboundPayload::parse(body)?;

    let session_id = target
        .attach_session()
        .then(|| state.session.current().value.clone());

    let request = FlowRequest {
        input_value: payload.input().to_string(),
        session_id,
    };
    debug!(route = target.route(), input = %request.input_value, "Relaying webhook");

    state.upstream.run_flow(target, &request).await
}
