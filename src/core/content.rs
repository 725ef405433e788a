//! Output content model.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One unit of produced content, serialized as `{"type": ..., "content": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Output {
    Text(String),
    Json(JsonValue),
}

impl Output {
    pub fn text(s: impl Into<String>) -> Self {
        Output::Text(s.into())
    }
}
