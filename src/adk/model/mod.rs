// SPDX-License-Identifier: MIT

//! Model module - transcript types and the provider seam
//!
//! Two provider families with incompatible wire shapes are funneled through a
//! single [`LlmClient`] by tagging requests and responses with their family.
//! Each family has its own request builder and response normalizer:
//! - [openai] - chat completions with OpenAI-style function calls
//! - [anthropic] - messages API with inline `tool_use` blocks
//!
//! [http] contains the reqwest backend that talks to both.

pub mod anthropic;
pub mod http;
pub mod openai;

use crate::adk::error::{ConductorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Supported provider families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    OpenAi,
    Anthropic,
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProvider::OpenAi => "openai",
            ModelProvider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelProvider {
    type Err = ConductorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ModelProvider::OpenAi),
            "anthropic" => Ok(ModelProvider::Anthropic),
            _ => Err(ConductorError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Transcript roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Structured payload, set on tool results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Tool calls requested on an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// The call a tool result answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            payload: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant turn that requested tools; kept in the transcript so that
    /// the following tool results have something to answer.
    pub fn assistant_with_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn tool_result(call: &ToolCall, content: impl Into<String>, payload: Value) -> Self {
        Self {
            payload: Some(payload),
            tool_call_id: Some(call.id.clone()),
            ..Self::new(Role::Tool, content)
        }
    }
}

/// Ordered transcript sent to a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub messages: Vec<Message>,
}

impl Prompt {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// System messages joined into one block (for families with a top-level system field)
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System && !m.content.is_empty())
            .map(|m| m.content.as_str())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// Sampling settings taken from the agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Provider-agnostic response every family normalizes into
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    /// Provider-native tool calls; `None` when the family reported none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    pub tokens_used: u64,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>, tokens_used: u64) -> Self {
        Self {
            content: content.into(),
            tool_calls: None,
            tokens_used,
        }
    }
}

/// Request body tagged with the family it is shaped for
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderRequest {
    OpenAi(Value),
    Anthropic(Value),
}

impl ProviderRequest {
    pub fn provider(&self) -> ModelProvider {
        match self {
            ProviderRequest::OpenAi(_) => ModelProvider::OpenAi,
            ProviderRequest::Anthropic(_) => ModelProvider::Anthropic,
        }
    }

    pub fn body(&self) -> &Value {
        match self {
            ProviderRequest::OpenAi(body) | ProviderRequest::Anthropic(body) => body,
        }
    }
}

/// Raw response tagged with the family that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    OpenAi(Value),
    Anthropic(Value),
}

impl ProviderResponse {
    /// Converge either family's shape on [`LlmResponse`]
    pub fn normalize(&self) -> Result<LlmResponse> {
        match self {
            ProviderResponse::OpenAi(raw) => openai::normalize_response(raw),
            ProviderResponse::Anthropic(raw) => anthropic::normalize_response(raw),
        }
    }
}

/// Chat completion backend for both provider families
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse>;
}
