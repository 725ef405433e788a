use async_trait::async_trait;
use serde_json::json;

use crate::core::content::Output;
use crate::core::error::ToolError;
use crate::core::tool::{required_str, Tool, ToolSpec};

fn text_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": { "text": { "type": "string" } },
        "required": ["text"]
    })
}

#[derive(Clone, Default)]
pub struct EchoTool;

impl ToolSpec for EchoTool {
    fn name(&self) -> &'static str { "echo" }
    fn description(&self) -> &'static str { "Echo back the provided text" }
    fn input_schema(&self) -> serde_json::Value { text_schema() }
}

#[async_trait]
impl Tool for EchoTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<Output, ToolError> {
        let text = required_str(arguments, "text")?;
        Ok(Output::text(text))
    }
}

#[derive(Clone, Default)]
pub struct UppercaseTool;

impl ToolSpec for UppercaseTool {
    fn name(&self) -> &'static str { "uppercase" }
    fn description(&self) -> &'static str { "Return the text in uppercase" }
    fn input_schema(&self) -> serde_json::Value { text_schema() }
}

#[async_trait]
impl Tool for UppercaseTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<Output, ToolError> {
        let text = required_str(arguments, "text")?;
        Ok(Output::text(text.to_uppercase()))
    }
}
