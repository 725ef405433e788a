use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::clients::sql::QueryExecutor;
use crate::core::tool::Tool;
use crate::tools::query::QueryTool;
use crate::tools::text::{EchoTool, UppercaseTool};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    Duplicate(&'static str),
}

/// Mutable staging area; turned into a read-only [`ToolRegistry`] by `build`.
#[derive(Default)]
pub struct RegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<&'static str, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<&mut Self, RegistryError> {
        let name = tool.name();
        if self.by_name.contains_key(name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(Arc::new(tool));
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            inner: Arc::new(Inner { tools: self.tools, by_name: self.by_name }),
        }
    }
}

struct Inner {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<&'static str, usize>,
}

/// Immutable name -> tool mapping. Cheap to clone and share across requests.
#[derive(Clone)]
pub struct ToolRegistry {
    inner: Arc<Inner>,
}

impl ToolRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.inner.by_name.get(name).map(|&i| Arc::clone(&self.inner.tools[i]))
    }

    /// Metadata for every tool, in registration order.
    pub fn list(&self) -> Vec<ToolMeta> {
        self.inner
            .tools
            .iter()
            .map(|t| ToolMeta {
                name: t.name(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tools.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

/// The startup registry: `echo`, `uppercase`, then `query` backed by `executor`.
pub fn build_registry(executor: Arc<dyn QueryExecutor>) -> Result<ToolRegistry, RegistryError> {
    let mut builder = ToolRegistry::builder();
    builder
        .register(EchoTool)?
        .register(UppercaseTool)?
        .register(QueryTool::new(executor))?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::sql::UnconfiguredExecutor;
    use crate::core::content::Output;
    use crate::core::error::ToolError;
    use crate::core::tool::ToolSpec;
    use async_trait::async_trait;

    struct Named(&'static str);

    impl ToolSpec for Named {
        fn name(&self) -> &'static str { self.0 }
        fn description(&self) -> &'static str { "test tool" }
        fn input_schema(&self) -> serde_json::Value { serde_json::json!({"type":"object"}) }
    }

    #[async_trait]
    impl Tool for Named {
        async fn call(&self, _args: &serde_json::Value) -> Result<Output, ToolError> {
            Ok(Output::text(self.0))
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut b = ToolRegistry::builder();
        b.register(Named("a")).unwrap();
        let err = b.register(Named("a")).err().unwrap();
        assert_eq!(err, RegistryError::Duplicate("a"));
        assert_eq!(b.build().len(), 1);
    }

    #[test]
    fn list_preserves_registration_order() {
        let mut b = ToolRegistry::builder();
        b.register(Named("z")).unwrap().register(Named("a")).unwrap().register(Named("m")).unwrap();
        let names: Vec<_> = b.build().list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[tokio::test]
    async fn get_returns_the_registered_tool() {
        let mut b = ToolRegistry::builder();
        b.register(Named("x")).unwrap();
        let reg = b.build();
        assert!(reg.get("missing").is_none());
        let out = reg.get("x").unwrap().call(&serde_json::json!({})).await.unwrap();
        assert_eq!(out, Output::text("x"));
    }

    #[test]
    fn startup_registry_has_the_three_builtins() {
        let reg = build_registry(Arc::new(UnconfiguredExecutor)).unwrap();
        let names: Vec<_> = reg.list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["echo", "uppercase", "query"]);
    }
}
