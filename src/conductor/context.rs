// SPDX-License-Identifier: MIT

//! Shared execution log
//!
//! Every agent that completes inside one execution appends its output here.
//! Concurrent agents share the same context; an append is one push under a
//! lock that is never held across an `.await`.

use crate::adk::agent::{AgentOutput, PromptContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// One recorded agent output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEntry {
    pub agent_id: String,
    pub agent_name: String,
    pub output: AgentOutput,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only log shared by all agents in one execution
#[derive(Debug)]
pub struct ExecutionContext {
    execution_id: String,
    entries: Mutex<Vec<ContextEntry>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::with_execution_id(Uuid::new_v4().to_string())
    }

    pub fn with_execution_id(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ContextEntry>> {
        // A panicking writer cannot leave a half-pushed entry behind
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an agent's output
    pub fn add_agent_output(&self, agent_id: &str, agent_name: &str, output: AgentOutput) {
        let entry = ContextEntry {
            agent_id: agent_id.to_string(),
            agent_name: agent_name.to_string(),
            output,
            recorded_at: Utc::now(),
        };
        self.lock().push(entry);
    }

    /// Snapshot of all entries in append order
    pub fn entries(&self) -> Vec<ContextEntry> {
        self.lock().clone()
    }

    /// Entries written by one agent
    pub fn messages_for(&self, agent_id: &str) -> Vec<ContextEntry> {
        self.lock()
            .iter()
            .filter(|e| e.agent_id == agent_id)
            .cloned()
            .collect()
    }

    pub fn latest_output(&self, agent_id: &str) -> Option<AgentOutput> {
        self.lock()
            .iter()
            .rev()
            .find(|e| e.agent_id == agent_id)
            .map(|e| e.output.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptContext for ExecutionContext {
    fn to_prompt_context(&self) -> Option<String> {
        let entries = self.lock();
        if entries.is_empty() {
            return None;
        }

        let lines: Vec<String> = entries
            .iter()
            .map(|e| format!("[{}]: {}", e.agent_name, e.output.as_text()))
            .collect();
        Some(lines.join("\n"))
    }
}
