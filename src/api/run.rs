//! Legacy single-shot endpoint at `/mcp`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value as J};

use crate::core::error::EnvelopeError;
use crate::core::run::{self, RunRequest, RunResponse};

impl IntoResponse for EnvelopeError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub async fn http(Json(req): Json<RunRequest>) -> Result<Json<RunResponse>, EnvelopeError> {
    let valid = run::validate(req)?;
    let resp = run::process(valid);
    tracing::info!(id = %resp.id, model = ?resp.model, "processed single-shot request");
    Ok(Json(resp))
}

/// Usage help for GET callers instead of a bare 405.
pub async fn usage() -> Json<J> {
    Json(json!({
        "detail": "Use POST /mcp with JSON body. Example: {\"inputs\": {\"text\": \"hello\"}}",
        "allowed_methods": ["POST"],
        "schema": {
            "request": {
                "model": "string?",
                "inputs": "any (required)",
                "instructions": "string?",
                "metadata": "object?"
            },
            "response": {
                "id": "uuid",
                "status": "succeeded",
                "model": "string?",
                "outputs": [ { "type": "text", "content": "string" } ]
            }
        },
        "rpc": {
            "endpoint": "POST /mcp/rpc",
            "methods": ["mcp.list_tools", "mcp.call_tool"]
        }
    }))
}
