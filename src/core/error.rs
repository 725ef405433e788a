use thiserror::Error;

/// JSON-RPC error codes returned on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            // Application-defined server error, not the reserved -32603.
            ErrorCode::InternalError => -32000,
        }
    }
}

/// Failure raised by a tool invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Caller supplied missing or malformed arguments.
    #[error("{0}")]
    InvalidParams(String),
    /// The tool could not complete; the message is safe to return to callers.
    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        ToolError::InvalidParams(msg.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ToolError::InvalidParams(_) => ErrorCode::InvalidParams,
            ToolError::Execution(_) => ErrorCode::InternalError,
        }
    }
}

/// Single-shot envelope precondition failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("`inputs` field is required")]
    MissingInputs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_contract() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32000);
    }

    #[test]
    fn tool_errors_display_their_message() {
        let e = ToolError::invalid_params("'text' field required");
        assert_eq!(e.to_string(), "'text' field required");
        assert_eq!(e.code(), ErrorCode::InvalidParams);
        assert_eq!(ToolError::Execution("boom".into()).code(), ErrorCode::InternalError);
    }

    #[test]
    fn envelope_error_mentions_inputs() {
        assert!(EnvelopeError::MissingInputs.to_string().contains("inputs"));
    }
}
