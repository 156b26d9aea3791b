// SPDX-License-Identifier: MIT

//! Tool catalog - where agents find their tools
//!
//! The catalog stores persisted tool records, per-agent tool assignments, and
//! the factories that turn a record's `tool_type` + `configuration` into a
//! runnable [`Tool`].

use crate::adk::error::{ConductorError, Result};
use crate::adk::ids::de_id;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

fn default_true() -> bool {
    true
}

/// A persisted tool record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tool_type: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub input_schema: Option<Value>,
    #[serde(default)]
    pub configuration: Value,
}

/// An agent's claim on a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolAssignment {
    #[serde(deserialize_with = "de_id")]
    pub tool_id: String,
    /// Higher runs first in the agent's tool list
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

/// Builds a tool instance from a record's configuration
pub trait ToolFactory: Send + Sync {
    fn create(&self, configuration: &Value) -> Result<Arc<dyn Tool>>;
}

impl<F> ToolFactory for F
where
    F: Fn(&Value) -> Result<Arc<dyn Tool>> + Send + Sync,
{
    fn create(&self, configuration: &Value) -> Result<Arc<dyn Tool>> {
        self(configuration)
    }
}

/// Source of tool records and instances
#[async_trait]
pub trait ToolCatalog: Send + Sync {
    /// Enabled assignments for an agent, in catalog order
    async fn find_enabled_by_agent_id(&self, agent_id: &str) -> Result<Vec<ToolAssignment>>;

    async fn find_by_id(&self, tool_id: &str) -> Result<Option<ToolRecord>>;

    fn create_tool(&self, tool_type: &str, configuration: &Value) -> Result<Arc<dyn Tool>>;
}

/// In-process catalog backed by maps
#[derive(Clone, Default)]
pub struct InMemoryToolCatalog {
    tools: Arc<RwLock<HashMap<String, ToolRecord>>>,
    assignments: Arc<RwLock<HashMap<String, Vec<ToolAssignment>>>>,
    factories: HashMap<String, Arc<dyn ToolFactory>>,
}

impl InMemoryToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a `tool_type`
    pub fn with_factory(mut self, tool_type: impl Into<String>, factory: Arc<dyn ToolFactory>) -> Self {
        self.factories.insert(tool_type.into(), factory);
        self
    }

    pub async fn add_tool(&self, record: ToolRecord) {
        let mut tools = self.tools.write().await;
        tools.insert(record.id.clone(), record);
    }

    pub async fn assign(&self, agent_id: impl Into<String>, assignment: ToolAssignment) {
        let mut assignments = self.assignments.write().await;
        assignments.entry(agent_id.into()).or_default().push(assignment);
    }

    pub fn tool_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        types.sort_unstable();
        types
    }
}

#[async_trait]
impl ToolCatalog for InMemoryToolCatalog {
    async fn find_enabled_by_agent_id(&self, agent_id: &str) -> Result<Vec<ToolAssignment>> {
        let assignments = self.assignments.read().await;
        Ok(assignments
            .get(agent_id)
            .map(|list| list.iter().filter(|a| a.is_enabled).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_by_id(&self, tool_id: &str) -> Result<Option<ToolRecord>> {
        let tools = self.tools.read().await;
        Ok(tools.get(tool_id).cloned())
    }

    fn create_tool(&self, tool_type: &str, configuration: &Value) -> Result<Arc<dyn Tool>> {
        let factory = self.factories.get(tool_type).ok_or_else(|| {
            ConductorError::tool(tool_type, format!("no factory registered for tool type '{}'", tool_type))
        })?;
        factory.create(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error;

    struct ConstTool(Value);

    #[async_trait]
    impl Tool for ConstTool {
        async fn invoke(&self, _args: Value) -> std::result::Result<Value, Box<dyn Error + Send + Sync>> {
            Ok(self.0.clone())
        }
    }

    fn record(id: &str) -> ToolRecord {
        ToolRecord {
            id: id.to_string(),
            name: format!("Tool {}", id),
            description: None,
            tool_type: "const".to_string(),
            is_active: true,
            input_schema: None,
            configuration: json!({"value": id}),
        }
    }

    fn catalog() -> InMemoryToolCatalog {
        let factory: Arc<dyn ToolFactory> =
            Arc::new(|cfg: &Value| -> Result<Arc<dyn Tool>> { Ok(Arc::new(ConstTool(cfg["value"].clone()))) });
        InMemoryToolCatalog::new().with_factory("const", factory)
    }

    #[tokio::test]
    async fn test_find_enabled_filters_disabled() {
        let catalog = catalog();
        catalog
            .assign("agent-1", ToolAssignment { tool_id: "a".into(), priority: 1, is_enabled: true })
            .await;
        catalog
            .assign("agent-1", ToolAssignment { tool_id: "b".into(), priority: 5, is_enabled: false })
            .await;

        let found = catalog.find_enabled_by_agent_id("agent-1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tool_id, "a");
        assert!(catalog.find_enabled_by_agent_id("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let catalog = catalog();
        catalog.add_tool(record("a")).await;
        assert_eq!(catalog.find_by_id("a").await.unwrap().unwrap().name, "Tool a");
        assert!(catalog.find_by_id("zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_tool_uses_factory() {
        let catalog = catalog();
        let tool = catalog.create_tool("const", &json!({"value": 3})).unwrap();
        assert_eq!(tool.invoke(json!({})).await.unwrap(), json!(3));
    }

    #[test]
    fn test_create_tool_unknown_type() {
        let err = catalog().create_tool("email", &Value::Null).err().unwrap();
        assert!(matches!(err, ConductorError::Tool { ref name, .. } if name == "email"));
    }

    #[test]
    fn test_record_accepts_numeric_id_and_defaults() {
        let rec: ToolRecord =
            serde_json::from_value(json!({"id": 12, "name": "Echo", "tool_type": "echo"})).unwrap();
        assert_eq!(rec.id, "12");
        assert!(rec.is_active);
        assert!(rec.input_schema.is_none());
    }
}
