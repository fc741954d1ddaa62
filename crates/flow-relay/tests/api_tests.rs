use axum::http::StatusCode;
use flow_relay::ServerConfig;
use pretty_assertions::assert_eq;
use serde_json::json;

use test_fixtures::{create_test_server, get_json, init_test_tracing, post_json, post_raw};

/// Config with no upstream URLs at all
fn unconfigured() -> ServerConfig {
    ServerConfig {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn test_root_status() {
    init_test_tracing();
    let router = create_test_server(unconfigured()).router();

    let (status, body) = get_json(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Webhook tool is running."}));
}

#[tokio::test]
async fn test_health_check_ignores_upstream_configuration() {
    init_test_tracing();
    let router = create_test_server(unconfigured()).router();

    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_echo_returns_payload_unchanged() {
    init_test_tracing();
    let router = create_test_server(unconfigured()).router();

    let (status, body) = post_json(&router, "/runTest", &json!({"input": "x", "extra": 1})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": {"input": "x", "extra": 1}}));
}

#[tokio::test]
async fn test_echo_without_input() {
    init_test_tracing();
    let router = create_test_server(unconfigured()).router();

    let payload = json!({"nested": {"a": [1, 2, 3]}, "flag": true});
    let (status, body) = post_json(&router, "/runTest", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": payload}));
}

#[tokio::test]
async fn test_echo_malformed_json_returns_envelope_with_200() {
    init_test_tracing();
    let router = create_test_server(unconfigured()).router();

    let (status, body) = post_raw(&router, "/runTest", "{\"input\": ").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error result"]
        .as_str()
        .unwrap()
        .starts_with("Error: Invalid JSON body"));
    assert!(body["traceback"].as_str().unwrap().starts_with("MalformedPayload"));
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn test_relay_rejects_non_object_body() {
    init_test_tracing();
    let router = create_test_server(unconfigured()).router();

    let (status, body) = post_raw(&router, "/runLangFlow", "\"just a string\"").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["error result"],
        json!("Error: Expected a JSON object, got a string")
    );
}

#[tokio::test]
async fn test_unset_upstream_fails_at_call_time() {
    init_test_tracing();
    let router = create_test_server(unconfigured()).router();

    for (route, env_var) in [
        ("/runLangFlow", "LANGFLOW_URL"),
        ("/runLangFlowEmail", "LANGFLOW_URL_EMAIL"),
        ("/runLangFlowDoc", "LANGFLOW_URL_DOC"),
    ] {
        let (status, body) = post_json(&router, route, &json!({"input": "hi"})).await;
        assert_eq!(status, StatusCode::OK, "route {}", route);
        assert_eq!(
            body["error result"],
            json!(format!(
                "Error: upstream URL for {} is not configured (set {})",
                route, env_var
            ))
        );
    }
}

#[tokio::test]
async fn test_hidden_traceback_is_omitted() {
    init_test_tracing();
    let config = ServerConfig {
        hide_traceback: true,
        ..unconfigured()
    };
    let router = create_test_server(config).router();

    let (status, body) = post_json(&router, "/runLangFlowDoc", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"error result": "Error: upstream URL for /runLangFlowDoc is not configured (set LANGFLOW_URL_DOC)"})
    );
}

/// Larger than axum's default 2 MB body limit
fn oversized_input() -> String {
    "x".repeat(3 * 1024 * 1024)
}

#[tokio::test]
async fn test_echo_accepts_body_over_two_megabytes() {
    init_test_tracing();
    let config = ServerConfig {
        log_payloads: false,
        ..unconfigured()
    };
    let router = create_test_server(config).router();

    let input = oversized_input();
    let (status, body) = post_json(&router, "/runTest", &json!({"input": input})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["result"]["input"].as_str() == Some(input.as_str()));
}

#[tokio::test]
async fn test_relay_body_over_two_megabytes_gets_envelope() {
    init_test_tracing();
    let router = create_test_server(unconfigured()).router();

    let (status, body) =
        post_json(&router, "/runLangFlowDoc", &json!({"input": oversized_input()})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["error result"],
        json!("Error: upstream URL for /runLangFlowDoc is not configured (set LANGFLOW_URL_DOC)")
    );

    // Oversized and malformed still yields an envelope
    let raw = format!("{{\"input\": \"{}", oversized_input());
    let (status, body) = post_raw(&router, "/runLangFlow", raw).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error result"]
        .as_str()
        .unwrap()
        .starts_with("Error: Invalid JSON body"));
}
