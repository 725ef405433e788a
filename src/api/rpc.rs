use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value as J};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::core::error::{ErrorCode, ToolError};
use crate::core::mcp::{self, RpcReq, RpcResp, JSONRPC_VERSION, METHOD_CALL_TOOL, METHOD_LIST_TOOLS};
use crate::infra::http::json as http_json;
use crate::tools::registry::ToolRegistry;

fn tools_list(reg: &ToolRegistry) -> J {
    json!({ "tools": reg.list() })
}

/// Resolve and run a tool. Every failure, including a panic inside the tool,
/// comes back as a `(code, message, data)` triple.
async fn call_tool(reg: &ToolRegistry, params: &J) -> Result<J, (ErrorCode, String, Option<J>)> {
    let name = match params.get("name") {
        None | Some(J::Null) => None,
        Some(J::String(s)) => Some(s.as_str()).filter(|s| !s.is_empty()),
        Some(_) => return Err((ErrorCode::InvalidParams, "'name' must be a string".to_string(), None)),
    }
    .ok_or_else(|| (ErrorCode::InvalidParams, "Missing 'name' in params".to_string(), None))?;
    let tool = reg
        .get(name)
        .ok_or_else(|| (ErrorCode::MethodNotFound, format!("Tool '{name}' not found"), None))?;
    let args = match params.get("arguments") {
        None | Some(J::Null) => json!({}),
        Some(v) => v.clone(),
    };

    let task = tokio::spawn(async move { tool.call(&args).await });
    match task.await {
        Ok(Ok(output)) => Ok(json!({ "outputs": [output] })),
        Ok(Err(ToolError::InvalidParams(msg))) => Err((ErrorCode::InvalidParams, msg, None)),
        Ok(Err(e @ ToolError::Execution(_))) => {
            tracing::error!(tool = %name, error = %e, "tool execution error");
            Err((e.code(), "Tool execution failure".to_string(), Some(J::String(e.to_string()))))
        }
        Err(join_err) => {
            tracing::error!(tool = %name, error = %join_err, "tool panicked");
            Err((
                ErrorCode::InternalError,
                "Tool execution failure".to_string(),
                Some(J::String(join_err.to_string())),
            ))
        }
    }
}

/// Route one envelope to exactly one response.
pub async fn dispatch(reg: &ToolRegistry, req: RpcReq) -> RpcResp {
    tracing::debug!(method = %req.method, id = %req.id, "rpc request");
    let id = req.id;
    if req.jsonrpc != JSONRPC_VERSION {
        return mcp::err(id, ErrorCode::InvalidRequest, "Invalid JSON-RPC version", None);
    }
    let params = req.params.unwrap_or_else(|| json!({}));

    let resp = match req.method.as_str() {
        METHOD_LIST_TOOLS => mcp::ok(id, tools_list(reg)),
        METHOD_CALL_TOOL => match call_tool(reg, &params).await {
            Ok(result) => mcp::ok(id, result),
            Err((code, message, data)) => mcp::err(id, code, message, data),
        },
        other => mcp::err(id, ErrorCode::MethodNotFound, format!("Method '{other}' not found"), None),
    };
    if let Some(e) = &resp.error {
        tracing::warn!(code = e.code, message = %e.message, "rpc error response");
    }
    resp
}

/// Map a body that could not be read as an envelope to a JSON-RPC error.
fn rejection_response(rejection: &JsonRejection) -> RpcResp {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            mcp::err(J::Null, ErrorCode::InvalidRequest, format!("invalid request: {e}"), None)
        }
        other => http_json::parse_error(format!("parse error: {other}")).0,
    }
}

// HTTP handler
pub async fn http(
    axum::extract::State(reg): axum::extract::State<ToolRegistry>,
    body: Result<Json<RpcReq>, JsonRejection>,
) -> (StatusCode, Json<RpcResp>) {
    match body {
        Ok(Json(req)) => (StatusCode::OK, Json(dispatch(&reg, req).await)),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "rejected rpc body");
            (StatusCode::BAD_REQUEST, Json(rejection_response(&rejection)))
        }
    }
}

/// Newline-delimited JSON-RPC over any reader/writer pair.
pub async fn serve_lines<R, W>(reg: ToolRegistry, input: R, mut output: W) -> anyhow::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let resp = match serde_json::from_str::<RpcReq>(&line) {
            Ok(req) => dispatch(&reg, req).await,
            Err(e) if e.is_data() => {
                mcp::err(J::Null, ErrorCode::InvalidRequest, format!("invalid request: {e}"), None)
            }
            Err(e) => http_json::parse_error(format!("parse error: {e}")).0,
        };
        let mut s = serde_json::to_string(&resp)?;
        s.push('\n');
        output.write_all(s.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}

// Stdio loop
pub async fn stdio_loop(reg: ToolRegistry) -> anyhow::Result<()> {
    tracing::info!("mode=stdio");
    serve_lines(reg, tokio::io::stdin(), tokio::io::stdout()).await
}
