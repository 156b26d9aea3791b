// SPDX-License-Identifier: MIT

//! Typed error handling for conductor-rs
//!
//! Only caller mistakes surface as `Err`. Failures of an individual agent run
//! (provider errors, tool failures, timeouts) are folded into result envelopes
//! by the executor and never abort sibling agents.

use thiserror::Error;

/// Top-level error type for conductor-rs
#[derive(Debug, Error)]
pub enum ConductorError {
    /// The executor was asked to run without an agent
    #[error("Agent is required")]
    AgentRequired,

    /// An agent id could not be resolved from the registry
    #[error("Agent '{agent_id}' not found")]
    AgentNotFound { agent_id: String },

    /// A dependency or routing graph contains a cycle
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    /// The agent's model provider is not one of the supported families
    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    /// A single agent run exceeded the execution timeout
    #[error("Agent '{agent_id}' timed out after {after_ms}ms")]
    Timeout { agent_id: String, after_ms: u64 },

    /// API errors from a provider backend
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// The provider answered with a shape we cannot normalize
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// A tool could not be created or invoked
    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    /// Configuration errors (missing env vars, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structural workflow problems detected while parsing or scheduling
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper for compatibility
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ConductorError>;

impl ConductorError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an agent not found error
    pub fn agent_not_found(agent_id: impl Into<String>) -> Self {
        Self::AgentNotFound {
            agent_id: agent_id.into(),
        }
    }

    /// Create a tool error
    pub fn tool(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a workflow error
    pub fn workflow(message: impl Into<String>) -> Self {
        Self::Workflow(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for ConductorError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for ConductorError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for ConductorError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err.to_string())
    }
}
