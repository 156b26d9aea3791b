// SPDX-License-Identifier: MIT

//! Agent outputs and per-run execution results

use crate::adk::tool::ToolResultRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Warning attached when the tool loop stops at its iteration cap
pub const MAX_ITERATIONS_WARNING: &str = "Max tool iterations reached";

/// Final output of an agent, serialized as `{type: "text"|"json", data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum AgentOutput {
    Text(String),
    Json(Value),
}

impl AgentOutput {
    /// Content that parses as JSON becomes `Json`, anything else stays `Text`
    pub fn from_content(content: &str) -> Self {
        match serde_json::from_str::<Value>(content) {
            Ok(value) => AgentOutput::Json(value),
            Err(_) => AgentOutput::Text(content.to_string()),
        }
    }

    /// The raw data, used as input for downstream agents
    pub fn data(&self) -> Value {
        match self {
            AgentOutput::Text(text) => Value::String(text.clone()),
            AgentOutput::Json(value) => value.clone(),
        }
    }

    /// Readable rendering for prompt context and CLI output
    pub fn as_text(&self) -> String {
        match self {
            AgentOutput::Text(text) => text.clone(),
            AgentOutput::Json(value) => value.to_string(),
        }
    }
}

/// Result of one agent invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<AgentOutput>,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub duration_ms: u64,
    /// LLM round-trips made by the tool loop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResultRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn completed(output: AgentOutput, tokens_used: u64) -> Self {
        Self {
            success: true,
            output: Some(output),
            tokens_used,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = elapsed.as_millis() as u64;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_content_becomes_json_output() {
        let out = AgentOutput::from_content(r#"{"intent": "search"}"#);
        assert_eq!(out, AgentOutput::Json(json!({"intent": "search"})));
    }

    #[test]
    fn test_plain_content_stays_text() {
        let out = AgentOutput::from_content("Hello there");
        assert_eq!(out, AgentOutput::Text("Hello there".to_string()));
    }

    #[test]
    fn test_output_serializes_with_type_and_data() {
        let text = serde_json::to_value(AgentOutput::Text("hi".into())).unwrap();
        assert_eq!(text, json!({"type": "text", "data": "hi"}));

        let data = serde_json::to_value(AgentOutput::Json(json!([1, 2]))).unwrap();
        assert_eq!(data, json!({"type": "json", "data": [1, 2]}));
    }

    #[test]
    fn test_failed_result_shape() {
        let result = serde_json::to_value(ExecutionResult::failed("boom")).unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["error"], "boom");
        assert!(result.get("output").is_none());
        assert!(result.get("warning").is_none());
    }
}
