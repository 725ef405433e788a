use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value as J};

use crate::clients::sql::{Columns, QueryExecutor, SelectQuery};
use crate::core::content::Output;
use crate::core::error::ToolError;
use crate::core::tool::{Tool, ToolSpec};
use crate::tools::filter::{self, is_identifier};

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 500;

/// Message returned to callers when the collaborator fails; the cause is only logged.
pub const EXECUTION_FAILED: &str = "query execution failed";

/// Bounded, read-only row query against one fixed relation.
#[derive(Clone)]
pub struct QueryTool {
    executor: Arc<dyn QueryExecutor>,
}

impl QueryTool {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }
}

impl ToolSpec for QueryTool {
    fn name(&self) -> &'static str { "query" }
    fn description(&self) -> &'static str {
        "Query rows from the configured table with optional columns, filter and limit"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "columns": { "type": "array", "items": { "type": "string" } },
                "where": { "type": "string", "description": "e.g. status = 'open' AND priority >= 2" },
                "limit": { "type": "integer", "minimum": 1, "maximum": MAX_LIMIT, "default": DEFAULT_LIMIT }
            },
            "required": []
        })
    }
}

#[async_trait]
impl Tool for QueryTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<Output, ToolError> {
        let query = parse_arguments(arguments)?;
        let start = Instant::now();
        let rows = self.executor.execute(&query).await.map_err(|e| {
            tracing::error!(error = %e, "query collaborator failed");
            crate::infra::logging::log_metric("query", "error_total", 1.0);
            ToolError::Execution(EXECUTION_FAILED.into())
        })?;
        crate::infra::logging::log_metric("query", "latency_ms", start.elapsed().as_secs_f64() * 1000.0);
        let count = rows.len();
        Ok(Output::Json(json!({ "rows": rows, "count": count })))
    }
}

/// Validate `columns`, `where` and `limit` into a [`SelectQuery`].
pub fn parse_arguments(args: &J) -> Result<SelectQuery, ToolError> {
    let columns = match args.get("columns") {
        None | Some(J::Null) => Columns::All,
        Some(J::Array(items)) => {
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                let name = item
                    .as_str()
                    .ok_or_else(|| ToolError::invalid_params("'columns' must be an array of strings"))?;
                if !is_identifier(name) {
                    return Err(ToolError::invalid_params(format!("invalid column name '{name}'")));
                }
                names.push(name.to_string());
            }
            if names.is_empty() { Columns::All } else { Columns::Named(names) }
        }
        Some(_) => return Err(ToolError::invalid_params("'columns' must be an array of strings")),
    };

    let filter = match args.get("where") {
        None | Some(J::Null) => None,
        Some(J::String(text)) => filter::parse(text)
            .map_err(|e| ToolError::invalid_params(format!("invalid 'where' filter: {e}")))?,
        Some(_) => return Err(ToolError::invalid_params("'where' must be a string")),
    };

    let limit = match args.get("limit") {
        None | Some(J::Null) => DEFAULT_LIMIT,
        Some(v) => v
            .as_u64()
            .filter(|n| (1..=u64::from(MAX_LIMIT)).contains(n))
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                ToolError::invalid_params(format!("'limit' must be an integer between 1 and {MAX_LIMIT}"))
            })?,
    };

    Ok(SelectQuery { columns, filter, limit })
}
