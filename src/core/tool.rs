use async_trait::async_trait;

use crate::core::content::Output;
use crate::core::error::ToolError;

/// Minimal metadata every tool must expose.
pub trait ToolSpec {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Descriptive only; each tool validates its own arguments.
    fn input_schema(&self) -> serde_json::Value;
}

/// Tool = Spec + invocation
#[async_trait]
pub trait Tool: ToolSpec + Send + Sync {
    async fn call(&self, arguments: &serde_json::Value) -> Result<Output, ToolError>;
}

/// Fetch a required string argument, failing with `InvalidParams` when absent.
pub fn required_str<'a>(arguments: &'a serde_json::Value, field: &str) -> Result<&'a str, ToolError> {
    match arguments.get(field) {
        None | Some(serde_json::Value::Null) => {
            Err(ToolError::invalid_params(format!("'{field}' field required")))
        }
        Some(v) => v
            .as_str()
            .ok_or_else(|| ToolError::invalid_params(format!("'{field}' must be a string"))),
    }
}
