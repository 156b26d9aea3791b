// SPDX-License-Identifier: MIT

//! Project file - agents, tools and tool assignments in one YAML/JSON document
//!
//! ```yaml
//! executor:
//!   max_tool_iterations: 10
//! agents:
//!   - id: 1
//!     name: Researcher
//!     model_provider: openai
//!     model_name: gpt-4o-mini
//!     system_prompt: You research things.
//! tools:
//!   - id: 7
//!     name: Echo Back
//!     tool_type: echo
//! assignments:
//!   - agent_id: 1
//!     tool_id: 7
//!     priority: 10
//! ```

use crate::adk::agent::{Agent, AgentConfig};
use crate::adk::catalog::{InMemoryToolCatalog, ToolAssignment, ToolCatalog, ToolRecord};
use crate::adk::error::Result;
use crate::adk::ids::de_id;
use crate::adk::model::LlmClient;
use crate::conductor::config::ExecutorSettings;
use crate::conductor::registry::InMemoryAgentRegistry;
use crate::conductor::tools::with_builtin_tools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentEntry {
    #[serde(deserialize_with = "de_id")]
    pub agent_id: String,
    #[serde(deserialize_with = "de_id")]
    pub tool_id: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub executor: Option<ExecutorSettings>,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
    #[serde(default)]
    pub assignments: Vec<AssignmentEntry>,
}

impl ProjectFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// YAML, which also accepts JSON documents
    pub fn parse_yaml(content: &str) -> Result<Self> {
        let project: ProjectFile = serde_yaml::from_str(content)?;
        Ok(project)
    }

    /// Catalog with the built-in tool types, this project's tools and assignments
    pub async fn build_catalog(&self) -> InMemoryToolCatalog {
        let catalog = with_builtin_tools(InMemoryToolCatalog::new());

        for tool in &self.tools {
            catalog.add_tool(tool.clone()).await;
        }
        for entry in &self.assignments {
            catalog
                .assign(
                    entry.agent_id.clone(),
                    ToolAssignment {
                        tool_id: entry.tool_id.clone(),
                        priority: entry.priority,
                        is_enabled: entry.is_enabled,
                    },
                )
                .await;
        }

        catalog
    }

    /// One agent per config, all sharing `llm` and `catalog`
    pub async fn build_registry(
        &self,
        llm: Arc<dyn LlmClient>,
        catalog: Arc<dyn ToolCatalog>,
    ) -> InMemoryAgentRegistry {
        let registry = InMemoryAgentRegistry::new();
        for config in &self.agents {
            let agent = Agent::new(config.clone(), llm.clone()).with_catalog(catalog.clone());
            registry.register(Arc::new(agent)).await;
        }
        log::info!("Registered {} agents", self.agents.len());
        registry
    }
}
