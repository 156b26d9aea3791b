// SPDX-License-Identifier: MIT

//! Workflow types
//!
//! Two layers live here:
//! - the stored record ([`WorkflowRecord`]), loose and exactly as persisted
//! - the parsed definition ([`WorkflowDefinition`]), typed and ready for planning

use crate::adk::error::{ConductorError, Result};
use crate::adk::ids::{de_id, de_id_list, de_opt_id};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

fn default_true() -> bool {
    true
}

/// A workflow as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    #[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_type: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub bot_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub entry_agent_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub agents_config: Vec<RawAgentEntry>,
    #[serde(default)]
    pub flow_config: RawFlowConfig,
}

/// One `agents_config` entry.
///
/// Stored entries name the agent by `agentId` (or `agent_id`), `id`, or
/// both; `agentId` wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredAgentEntry")]
pub struct RawAgentEntry {
    #[serde(rename = "agentId", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(rename = "dependsOn")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

#[derive(Deserialize)]
struct StoredAgentEntry {
    #[serde(rename = "agentId", alias = "agent_id", default, deserialize_with = "de_opt_id")]
    agent_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    id: Option<String>,
    #[serde(default)]
    order: Option<u32>,
    #[serde(default)]
    role: Option<String>,
    #[serde(rename = "dependsOn", alias = "depends_on", default, deserialize_with = "de_id_list")]
    depends_on: Vec<String>,
    #[serde(default)]
    config: Option<Value>,
}

impl From<StoredAgentEntry> for RawAgentEntry {
    fn from(stored: StoredAgentEntry) -> Self {
        Self {
            agent_id: stored.agent_id.or(stored.id),
            order: stored.order,
            role: stored.role,
            depends_on: stored.depends_on,
            config: stored.config,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFlowConfig {
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub stages: Vec<RawStage>,
    #[serde(default)]
    pub conditions: Vec<Value>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStage {
    #[serde(rename = "type", default)]
    pub stage_type: Option<String>,
    #[serde(default, deserialize_with = "de_id_list")]
    pub agents: Vec<String>,
}

/// Directed hand-off between two agents of a conditional workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(deserialize_with = "de_id")]
    pub from_agent_id: String,
    #[serde(deserialize_with = "de_id")]
    pub target_agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowType {
    Sequential,
    Parallel,
    Conditional,
    Mixed,
}

impl WorkflowType {
    pub const ALL: [WorkflowType; 4] = [
        WorkflowType::Sequential,
        WorkflowType::Parallel,
        WorkflowType::Conditional,
        WorkflowType::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::Sequential => "sequential",
            WorkflowType::Parallel => "parallel",
            WorkflowType::Conditional => "conditional",
            WorkflowType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowType {
    type Err = ConductorError;

    fn from_str(s: &str) -> Result<Self> {
        WorkflowType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConductorError::workflow(format!("unknown workflow type '{}'", s)))
    }
}

/// Strategies a mixed-workflow stage can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    Sequential,
    Parallel,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::Sequential => "sequential",
            ExecutionStrategy::Parallel => "parallel",
        }
    }
}

impl FromStr for ExecutionStrategy {
    type Err = ConductorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequential" => Ok(ExecutionStrategy::Sequential),
            "parallel" => Ok(ExecutionStrategy::Parallel),
            other => Err(ConductorError::workflow(format!(
                "unknown stage type '{}'",
                other
            ))),
        }
    }
}

/// A parsed workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub workflow_type: WorkflowType,
    pub bot_id: Option<String>,
    pub entry_agent_id: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub agents: Vec<AgentSlot>,
    pub flow: FlowSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSlot {
    pub agent_id: String,
    pub order: u32,
    pub role: Option<String>,
    /// Opaque per-slot settings, carried through untouched
    pub config: Option<Value>,
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowSpec {
    pub routes: Vec<Route>,
    pub stages: Vec<Stage>,
    pub conditions: Vec<Value>,
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    #[serde(rename = "type")]
    pub kind: ExecutionStrategy,
    pub agents: Vec<String>,
}

/// What the parser hands to a scheduler, per workflow type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExecutionOrder {
    /// Agent ids by ascending `order`
    Sequential(Vec<String>),
    /// One batch holding every agent id
    Parallel(Vec<Vec<String>>),
    /// The entry agent, or nothing when none is set
    Conditional(Vec<String>),
    /// Stages verbatim, run one at a time
    Mixed(Vec<Stage>),
}

impl ExecutionOrder {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A condition attached to a route or declared at the top of the flow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingCondition {
    pub from_agent_id: Option<String>,
    pub target_agent_id: Option<String>,
    pub condition: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircularCheck {
    pub has_circular: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Close the report; valid iff no errors were recorded
    pub fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}
