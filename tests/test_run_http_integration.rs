use std::sync::Arc;

use axum::body::{to_bytes, Body};
use hyper::{Request, StatusCode};
use mcp_tool_gateway::clients::sql::UnconfiguredExecutor;
use mcp_tool_gateway::infra::http_app::build_app;
use mcp_tool_gateway::tools::registry::build_registry;
use serde_json::Value as J;
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;

async fn send(method: &str, uri: &str, body: &'static str) -> (StatusCode, Vec<u8>) {
    let app = build_app(build_registry(Arc::new(UnconfiguredExecutor)).unwrap());
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn single_shot_echoes_text_on_both_paths() {
    for uri in ["/mcp", "/mcp/"] {
        let (status, bytes) = send("POST", uri, r#"{"inputs":{"text":"hello"}}"#).await;
        assert_eq!(status, StatusCode::OK);
        let v: J = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["status"], "succeeded");
        assert_eq!(v["outputs"][0]["content"], "hello");
        assert_eq!(v["outputs"][0]["type"], "text");
    }
}

#[tokio::test]
async fn single_shot_missing_inputs_is_400() {
    let (status, bytes) = send("POST", "/mcp", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: J = serde_json::from_slice(&bytes).unwrap();
    assert!(v["detail"].as_str().unwrap().contains("inputs"));
}

#[tokio::test]
async fn healthz_root_and_usage() {
    let (status, bytes) = send("GET", "/healthz", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"ok");

    let (status, bytes) = send("GET", "/", "").await;
    assert_eq!(status, StatusCode::OK);
    let v: J = serde_json::from_slice(&bytes).unwrap();
    assert!(v["message"].as_str().unwrap().contains("running"));

    let (status, bytes) = send("GET", "/mcp/", "").await;
    assert_eq!(status, StatusCode::OK);
    let v: J = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v["allowed_methods"][0], "POST");
}
