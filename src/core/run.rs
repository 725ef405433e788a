//! Single-shot ("process this payload") envelope.
//!
//! This mode predates the JSON-RPC surface: there is no method routing, the
//! payload is turned into exactly one text output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as J};
use uuid::Uuid;

use crate::core::content::Output;
use crate::core::error::EnvelopeError;

pub const STATUS_SUCCEEDED: &str = "succeeded";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RunRequest {
    #[serde(default)]
    pub model: Option<String>,
    /// JSON `null` is treated the same as an absent field.
    #[serde(default)]
    pub inputs: Option<J>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, J>>,
}

/// A request whose preconditions hold.
#[derive(Debug, Clone)]
pub struct ValidRun {
    pub model: Option<String>,
    pub inputs: J,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunResponse {
    pub id: String,
    pub status: String,
    pub model: Option<String>,
    pub outputs: Vec<Output>,
}

pub fn validate(req: RunRequest) -> Result<ValidRun, EnvelopeError> {
    let inputs = req.inputs.ok_or(EnvelopeError::MissingInputs)?;
    Ok(ValidRun { model: req.model, inputs })
}

/// Text derived from an arbitrary payload: the `text` member of an object when
/// present, the whole payload otherwise. Never fails; a value that cannot be
/// rendered becomes an empty string.
pub fn derive_output_text(raw: &J) -> String {
    match raw {
        J::Object(map) if map.contains_key("text") => textual_form(&map["text"]),
        other => textual_form(other),
    }
}

fn textual_form(v: &J) -> String {
    match v {
        J::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to derive output text");
            String::new()
        }),
    }
}

pub fn process(run: ValidRun) -> RunResponse {
    let text = derive_output_text(&run.inputs);
    RunResponse {
        id: Uuid::new_v4().to_string(),
        status: STATUS_SUCCEEDED.into(),
        model: run.model,
        outputs: vec![Output::Text(text)],
    }
}
