// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Serialized tool results kept in `tool_results` are cut to this many characters
pub const TOOL_RESULT_PREVIEW_CHARS: usize = 500;

/// A runtime tool instance created by a catalog.
///
/// Name, description and schema live on the persisted record; the instance
/// only knows how to run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with the given arguments and return the result
    async fn invoke(&self, args: Value) -> Result<Value, Box<dyn Error + Send + Sync>>;
}

/// A tool as exposed to the model for one agent instance
#[derive(Clone)]
pub struct ToolDefinition {
    pub id: String,
    /// Identifier-safe name used for function calling
    pub name: String,
    pub description: String,
    pub tool_type: String,
    pub input_schema: Value,
    pub instance: Arc<dyn Tool>,
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("tool_type", &self.tool_type)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

impl ToolDefinition {
    /// `{type: "function", function: {name, description, parameters}}`
    pub fn to_openai_function(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema
            }
        })
    }

    /// `{name, description, input_schema}`
    pub fn to_anthropic_tool(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema
        })
    }
}

/// Input contract used when a tool record declares none
pub fn default_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

/// Turn a display name into a function-calling identifier.
///
/// Whitespace runs become `_`, anything outside `[a-z0-9_-]` is dropped and
/// the result is capped at 64 characters.
pub fn sanitize_tool_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push('_');
            pending_space = false;
        }
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        }
    }

    out.chars().take(64).collect()
}

/// Outcome of a single tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ToolOutcome {
    pub fn ok(result: Value, duration_ms: u64) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            duration_ms,
        }
    }

    pub fn failed(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// Summary of one tool call kept on the agent's execution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultRecord {
    pub tool: String,
    pub success: bool,
    pub result: String,
}

impl ToolResultRecord {
    pub fn from_outcome(tool: &str, outcome: &ToolOutcome) -> Self {
        let full = match (&outcome.result, &outcome.error) {
            (Some(value), _) => serde_json::to_string(value).unwrap_or_default(),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };

        Self {
            tool: tool.to_string(),
            success: outcome.success,
            result: truncate(&full, TOOL_RESULT_PREVIEW_CHARS),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopTool;

    #[async_trait]
    impl Tool for NoopTool {
        async fn invoke(&self, _args: Value) -> Result<Value, Box<dyn Error + Send + Sync>> {
            Ok(Value::Null)
        }
    }

    fn definition() -> ToolDefinition {
        ToolDefinition {
            id: "t1".to_string(),
            name: "web_search".to_string(),
            description: "Search the web".to_string(),
            tool_type: "http".to_string(),
            input_schema: default_input_schema(),
            instance: Arc::new(NoopTool),
        }
    }

    #[test]
    fn test_sanitize_replaces_spaces() {
        assert_eq!(sanitize_tool_name("Web Search"), "web_search");
        assert_eq!(sanitize_tool_name("  send   email  "), "send_email");
    }

    #[test]
    fn test_sanitize_drops_invalid_characters() {
        assert_eq!(sanitize_tool_name("Run (Python) Code!"), "run_python_code");
        assert_eq!(sanitize_tool_name("http-get"), "http-get");
    }

    #[test]
    fn test_sanitize_caps_length() {
        let long = "a".repeat(100);
        assert_eq!(sanitize_tool_name(&long).len(), 64);
    }

    #[test]
    fn test_projections() {
        let def = definition();
        let f = def.to_openai_function();
        assert_eq!(f["type"], "function");
        assert_eq!(f["function"]["name"], "web_search");
        assert_eq!(f["function"]["parameters"]["type"], "object");

        let t = def.to_anthropic_tool();
        assert_eq!(t["name"], "web_search");
        assert_eq!(t["input_schema"]["required"], json!([]));
    }

    #[test]
    fn test_record_truncates_long_results() {
        let outcome = ToolOutcome::ok(json!("x".repeat(2000)), 3);
        let record = ToolResultRecord::from_outcome("echo", &outcome);
        assert!(record.success);
        assert_eq!(record.result.chars().count(), TOOL_RESULT_PREVIEW_CHARS + 1);
        assert!(record.result.ends_with('…'));
    }

    #[test]
    fn test_record_keeps_error_message() {
        let outcome = ToolOutcome::failed("Tool not found: nope", 0);
        let record = ToolResultRecord::from_outcome("nope", &outcome);
        assert!(!record.success);
        assert_eq!(record.result, "Tool not found: nope");
    }
}
