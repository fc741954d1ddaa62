//! Diagnostic echo endpoint
//!
//! `POST /runTest` hands the parsed body straight back, which lets callers
//! check reachability and payload shape without touching a flow.

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, info};

use super::AppState;
use crate::payload::InboundPayload;

pub async fn handle_echo(State(state): State<AppState>, body: Bytes) -> Response {
    let payload = match InboundPayload::parse(&body) {
        Ok(payload) => payload,
        Err(err) => return state.errors.envelope("/runTest", &err).into_response(),
    };

    if state.log_payloads {
        info!(user_data = %payload.clone().into_value(), "User data");
        info!(user_input = payload.input(), "User input");
    } else {
        debug!(fields = payload.fields().len(), "Echoing payload");
    }

    Json(json!({ "result": payload.into_value() })).into_response()
}
