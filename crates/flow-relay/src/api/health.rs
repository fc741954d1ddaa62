//! Liveness endpoints
//!
//! Both probes are static; they do not look at upstream configuration.

use axum::Json;
use serde_json::{json, Value};

/// `GET /`
pub async fn root_status() -> Json<Value> {
    Json(json!({ "message": "Webhook tool is running." }))
}

/// `GET /health`
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
