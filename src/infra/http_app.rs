use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::api;
use crate::tools::registry::ToolRegistry;

/// `/healthz`, the single-shot endpoint at `/mcp` (with and without trailing slash)
/// and the JSON-RPC endpoint at `/mcp/rpc`.
pub fn build_app(registry: ToolRegistry) -> Router {
    Router::new()
        .route("/", get(|| async { Json(json!({ "message": "MCP tool gateway is running" })) }))
        .route("/healthz", get(|| async { "ok" }))
        .route("/mcp", post(api::run::http).get(api::run::usage))
        .route("/mcp/", post(api::run::http).get(api::run::usage))
        .route("/mcp/rpc", post(api::rpc::http))
        .with_state(registry)
}
