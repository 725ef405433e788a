use axum::Json;

use crate::core::error::ErrorCode;
use crate::core::mcp::{err as rpc_err, RpcResp};

pub fn error(id: serde_json::Value, code: ErrorCode, message: impl Into<String>) -> Json<RpcResp> {
    Json(rpc_err(id, code, message, None))
}

/// Body was not valid JSON, so no id can be echoed.
pub fn parse_error(message: impl Into<String>) -> Json<RpcResp> {
    error(serde_json::Value::Null, ErrorCode::ParseError, message)
}
