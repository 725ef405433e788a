//! JSON-RPC envelope shared by the HTTP and stdio transports.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

use crate::core::error::ErrorCode;

/// The only protocol version the gateway speaks.
pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_LIST_TOOLS: &str = "mcp.list_tools";
pub const METHOD_CALL_TOOL: &str = "mcp.call_tool";

#[derive(Deserialize, Debug, Clone)]
pub struct RpcReq {
    pub jsonrpc: String,
    /// String, number or null; echoed verbatim. Absent deserializes to null.
    #[serde(default)]
    pub id: J,
    pub method: String,
    #[serde(default)]
    pub params: Option<J>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcResp {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: J,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<J>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErr>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcErr {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<J>,
}

pub fn ok(id: J, result: J) -> RpcResp {
    RpcResp { jsonrpc: JSONRPC_VERSION.into(), id, result: Some(result), error: None }
}

pub fn err(id: J, code: ErrorCode, msg: impl Into<String>, data: Option<J>) -> RpcResp {
    RpcResp {
        jsonrpc: JSONRPC_VERSION.into(),
        id,
        result: None,
        error: Some(RpcErr { code: code.code(), message: msg.into(), data }),
    }
}
