// SPDX-License-Identifier: MIT

//! Agent module - one LLM-backed role
//!
//! An [`Agent`] owns its configuration and provides the primitives the
//! executor drives: tool loading, prompt construction, provider invocation
//! and output interpretation. It never decides when to loop or how to combine
//! with other agents.

mod output;

pub use output::{AgentOutput, ExecutionResult, MAX_ITERATIONS_WARNING};

use crate::adk::catalog::{ToolCatalog, ToolRecord};
use crate::adk::error::Result;
use crate::adk::ids::de_id;
use crate::adk::model::{
    anthropic, openai, ChatSettings, LlmClient, LlmResponse, Message, ModelProvider, Prompt,
    ProviderRequest,
};
use crate::adk::tool::{
    default_input_schema, sanitize_tool_name, Tool, ToolDefinition, ToolOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

fn default_provider() -> String {
    "openai".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

/// Agent configuration, immutable once the agent is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_provider")]
    pub model_provider: String,
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Anything that can summarize earlier work for a prompt
pub trait PromptContext: Send + Sync {
    fn to_prompt_context(&self) -> Option<String>;
}

/// Serializable view of an agent for inspection; no client handles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub role: String,
    pub model_provider: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub capabilities: Vec<String>,
    pub tools: Vec<String>,
}

/// LLM-backed agent
pub struct Agent {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    catalog: Option<Arc<dyn ToolCatalog>>,
    tools: OnceCell<Vec<ToolDefinition>>,
}

impl Agent {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            llm,
            catalog: None,
            tools: OnceCell::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn ToolCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Fetch this agent's enabled tools from the catalog.
    ///
    /// Ordered by priority, highest first; ties keep catalog order. Inactive
    /// or missing tools are skipped. No id or no catalog yields an empty list.
    pub async fn load_tools(&self) -> Result<Vec<ToolDefinition>> {
        let catalog = match &self.catalog {
            Some(catalog) if !self.config.id.is_empty() => catalog,
            _ => return Ok(Vec::new()),
        };

        let mut assignments = catalog.find_enabled_by_agent_id(&self.config.id).await?;
        assignments.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut definitions = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let Some(record) = catalog.find_by_id(&assignment.tool_id).await? else {
                log::warn!(
                    "Agent {}: assigned tool {} does not exist",
                    self.config.name,
                    assignment.tool_id
                );
                continue;
            };

            if !record.is_active {
                log::debug!("Agent {}: skipping inactive tool {}", self.config.name, record.name);
                continue;
            }

            match catalog.create_tool(&record.tool_type, &record.configuration) {
                Ok(instance) => definitions.push(Self::build_tool_definition(&record, instance)),
                Err(e) => log::warn!(
                    "Agent {}: could not create tool {}: {}",
                    self.config.name,
                    record.name,
                    e
                ),
            }
        }

        log::info!(
            "Agent {} loaded {} tools",
            self.config.name,
            definitions.len()
        );
        Ok(definitions)
    }

    /// Load tools once and keep them for the lifetime of this agent
    pub async fn ensure_tools(&self) -> Result<&[ToolDefinition]> {
        self.tools
            .get_or_try_init(|| self.load_tools())
            .await
            .map(|tools| tools.as_slice())
    }

    pub fn tools_loaded(&self) -> bool {
        self.tools.initialized()
    }

    /// Loaded tools, empty until `ensure_tools` has run
    pub fn tools(&self) -> &[ToolDefinition] {
        self.tools.get().map(|t| t.as_slice()).unwrap_or(&[])
    }

    /// Map a persisted record onto a model-facing definition
    pub fn build_tool_definition(record: &ToolRecord, instance: Arc<dyn Tool>) -> ToolDefinition {
        ToolDefinition {
            id: record.id.clone(),
            name: sanitize_tool_name(&record.name),
            description: record.description.clone().unwrap_or_default(),
            tool_type: record.tool_type.clone(),
            input_schema: record
                .input_schema
                .clone()
                .unwrap_or_else(default_input_schema),
            instance,
        }
    }

    /// System prompt, optional earlier-context block, then the input
    pub fn build_prompt(&self, input: &Value, context: Option<&dyn PromptContext>) -> Prompt {
        let mut messages = vec![Message::system(self.config.system_prompt.clone())];

        if let Some(summary) = context.and_then(|c| c.to_prompt_context()) {
            messages.push(Message::system(format!("Previous context:\n{}", summary)));
        }

        let content = match input {
            Value::String(text) => text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        };
        messages.push(Message::user(content));

        Prompt::new(messages)
    }

    fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            model: self.config.model_name.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Send the prompt to this agent's provider family and normalize the reply
    pub async fn call_llm(&self, prompt: &Prompt) -> Result<LlmResponse> {
        let provider: ModelProvider = self.config.model_provider.parse()?;
        let settings = self.chat_settings();

        let request = match provider {
            ModelProvider::OpenAi => ProviderRequest::OpenAi(openai::build_request(
                &settings,
                prompt,
                &self.build_openai_functions(),
            )),
            ModelProvider::Anthropic => ProviderRequest::Anthropic(anthropic::build_request(
                &settings,
                prompt,
                &self.build_anthropic_tools(),
            )),
        };

        let response = self.llm.send(request).await?;
        response.normalize()
    }

    /// Invoke a loaded tool by name. Failures come back as an outcome, not an error.
    pub async fn execute_tool(&self, name: &str, args: Value) -> ToolOutcome {
        let Some(tool) = self.tools().iter().find(|t| t.name == name) else {
            log::warn!("Agent {}: tool not found: {}", self.config.name, name);
            return ToolOutcome::failed(format!("Tool not found: {}", name), 0);
        };

        let started = Instant::now();
        let result = tool.instance.invoke(args).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(value) => ToolOutcome::ok(value, duration_ms),
            Err(e) => {
                log::error!("Tool {} failed: {}", name, e);
                ToolOutcome::failed(e.to_string(), duration_ms)
            }
        }
    }

    /// Single LLM round-trip without tools
    pub async fn execute(&self, input: &Value, context: Option<&dyn PromptContext>) -> ExecutionResult {
        let started = Instant::now();
        let prompt = self.build_prompt(input, context);

        match self.call_llm(&prompt).await {
            Ok(response) => ExecutionResult::completed(
                AgentOutput::from_content(&response.content),
                response.tokens_used,
            )
            .with_duration(started.elapsed()),
            Err(e) => {
                log::error!("Agent {} failed: {}", self.config.name, e);
                ExecutionResult::failed(e.to_string()).with_duration(started.elapsed())
            }
        }
    }

    pub fn build_openai_functions(&self) -> Vec<Value> {
        self.tools().iter().map(|t| t.to_openai_function()).collect()
    }

    pub fn build_anthropic_tools(&self) -> Vec<Value> {
        self.tools().iter().map(|t| t.to_anthropic_tool()).collect()
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.config.id.clone(),
            name: self.config.name.clone(),
            role: self.config.role.clone(),
            model_provider: self.config.model_provider.clone(),
            model_name: self.config.model_name.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            capabilities: self.config.capabilities.clone(),
            tools: self.tools().iter().map(|t| t.name.clone()).collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.summary()).unwrap_or(Value::Null)
    }
}
