//! API module for the flow relay
//!
//! This module contains the routes and handlers. Every POST route answers
//! with HTTP 200; failures are reported in the body as an error envelope.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod echo;
pub mod errors;
pub mod health;
pub mod relay;

use crate::session::SessionStore;
use crate::upstream::{RelayTarget, UpstreamClient};
pub use errors::{ErrorEnvelope, ErrorFormatter};

/// State shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Pooled client for the flow endpoints
    pub upstream: UpstreamClient,
    /// Current session token
    pub session: SessionStore,
    /// Builds error bodies
    pub errors: ErrorFormatter,
    /// Log full inbound payloads
    pub log_payloads: bool,
}

/// Build the router for all endpoints
pub fn build_router(state: AppState, targets: impl IntoIterator<Item = RelayTarget>) -> Router {
    let mut router = Router::new()
        // Liveness
        .route("/", get(health::root_status))
        .route("/health", get(health::health_check))
        // Diagnostics
        .route("/runTest", post(echo::handle_echo));

    // Flow relays
    for target in targets {
        let route = target.route();
        router = router.route(route, relay_route(target));
    }

    // No request body size cap
    router
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST handler bound to one relay target
fn relay_route(target: RelayTarget) -> MethodRouter<AppState> {
    let target = Arc::new(target);
    post(move |State(state): State<AppState>, body: Bytes| {
        let target = Arc::clone(&target);
        async move { relay::handle_relay(state, &target, body).await }
    })
}
