// SPDX-License-Identifier: MIT

//! Result envelopes returned by the executor strategies

use crate::adk::agent::{AgentOutput, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One agent's result, tagged with who produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunResult {
    pub agent_id: String,
    pub agent_name: String,
    #[serde(flatten)]
    pub execution: ExecutionResult,
}

impl AgentRunResult {
    pub fn new(agent_id: &str, agent_name: &str, execution: ExecutionResult) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            agent_name: agent_name.to_string(),
            execution,
        }
    }

    pub fn success(&self) -> bool {
        self.execution.success
    }

    pub fn output(&self) -> Option<&AgentOutput> {
        self.execution.output.as_ref()
    }

    /// Output data for the next consumer, `null` when there is none
    pub fn output_data(&self) -> Value {
        self.output().map(|o| o.data()).unwrap_or(Value::Null)
    }

    pub fn error(&self) -> Option<&str> {
        self.execution.error.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequentialOutcome {
    pub success: bool,
    pub completed_steps: usize,
    pub results: Vec<AgentRunResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SequentialOutcome {
    /// Output of the last agent that ran
    pub fn final_output(&self) -> Value {
        self.results.last().map(|r| r.output_data()).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelOutcome {
    pub success: bool,
    pub completed_steps: usize,
    pub successful: Vec<AgentRunResult>,
    pub failed: Vec<AgentRunResult>,
    /// Outputs of the successful agents, in input order
    pub outputs: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyOutcome {
    pub success: bool,
    pub results: Vec<AgentRunResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyOutcome {
    pub fn result_for(&self, agent_id: &str) -> Option<&AgentRunResult> {
        self.results.iter().find(|r| r.agent_id == agent_id)
    }
}

/// One step of a workflow plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOutcome {
    /// Strategy that ran the stage: `sequential`, `parallel`, `dependencies` or `single`
    pub kind: String,
    pub success: bool,
    pub results: Vec<AgentRunResult>,
    /// Aggregate handed to the next stage
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutcome {
    pub workflow_id: String,
    pub success: bool,
    pub stages: Vec<StageOutcome>,
    pub final_output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
