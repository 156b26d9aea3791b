// SPDX-License-Identifier: MIT

//! Multi-agent composition strategies

use super::AgentExecutor;
use crate::adk::agent::Agent;
use crate::adk::error::{ConductorError, Result};
use crate::adk::ids::{de_id, de_id_list};
use crate::conductor::context::ExecutionContext;
use crate::conductor::graph::DependencyGraph;
use crate::conductor::registry::AgentRegistry;
use crate::conductor::result::{
    AgentRunResult, DependencyOutcome, ParallelOutcome, SequentialOutcome,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One node of a dependency run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyConfig {
    #[serde(deserialize_with = "de_id")]
    pub agent_id: String,
    #[serde(default, deserialize_with = "de_id_list")]
    pub depends_on: Vec<String>,
}

impl DependencyConfig {
    pub fn new(agent_id: impl Into<String>, depends_on: &[&str]) -> Self {
        Self {
            agent_id: agent_id.into(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl AgentExecutor {
    /// Run agents in order, feeding each one's output data to the next.
    /// Stops at the first failure.
    pub async fn execute_sequential(
        &self,
        agents: &[Arc<Agent>],
        input: &Value,
        context: &ExecutionContext,
    ) -> SequentialOutcome {
        let mut current = input.clone();
        let mut results = Vec::with_capacity(agents.len());

        for (step, agent) in agents.iter().enumerate() {
            let result = self.run_agent(agent, &current, context).await;

            if !result.success() {
                let error = format!(
                    "{} failed: {}",
                    result.agent_id,
                    result.error().unwrap_or("unknown error")
                );
                results.push(result);
                return SequentialOutcome {
                    success: false,
                    completed_steps: step,
                    results,
                    error: Some(error),
                };
            }

            current = result.output_data();
            results.push(result);
        }

        SequentialOutcome {
            success: true,
            completed_steps: agents.len(),
            results,
            error: None,
        }
    }

    /// Run all agents on the same input and wait for every one of them
    pub async fn execute_parallel(
        &self,
        agents: &[Arc<Agent>],
        input: &Value,
        context: &ExecutionContext,
    ) -> ParallelOutcome {
        let results = join_all(agents.iter().map(|agent| self.run_agent(agent, input, context))).await;

        let (successful, failed): (Vec<AgentRunResult>, Vec<AgentRunResult>) =
            results.into_iter().partition(|r| r.success());
        let outputs = successful.iter().map(|r| r.output_data()).collect();

        ParallelOutcome {
            success: failed.is_empty(),
            completed_steps: successful.len(),
            successful,
            failed,
            outputs,
        }
    }

    /// Run agents level by level as their dependencies complete.
    ///
    /// Rejects cycles, unknown dependency ids and unregistered agents before
    /// any agent runs. Duplicate ids keep their first config. A failing agent
    /// lets its level finish, then no further level starts.
    pub async fn execute_with_dependencies(
        &self,
        configs: &[DependencyConfig],
        registry: &dyn AgentRegistry,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<DependencyOutcome> {
        let configs = dedupe_configs(configs);

        let mut graph = DependencyGraph::new();
        for config in &configs {
            graph.add_node(&config.agent_id);
            for dep in &config.depends_on {
                graph.add_edge(&config.agent_id, dep);
            }
        }
        if let Some(cycle) = graph.find_cycle() {
            log::error!("Circular dependency: {}", cycle.join(" -> "));
            return Err(ConductorError::CircularDependency(cycle));
        }

        let known: HashSet<&str> = configs.iter().map(|c| c.agent_id.as_str()).collect();
        for config in &configs {
            if let Some(dep) = config.depends_on.iter().find(|d| !known.contains(d.as_str())) {
                return Err(ConductorError::workflow(format!(
                    "Agent {} depends on unknown agent {}",
                    config.agent_id, dep
                )));
            }
        }

        let mut nodes: Vec<(&DependencyConfig, Arc<Agent>)> = Vec::with_capacity(configs.len());
        for config in &configs {
            let agent = registry
                .get(&config.agent_id)
                .await
                .ok_or_else(|| ConductorError::agent_not_found(&config.agent_id))?;
            nodes.push((*config, agent));
        }

        let mut outputs: HashMap<String, Value> = HashMap::new();
        let mut results = Vec::with_capacity(nodes.len());
        let mut level = 0usize;

        while !nodes.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = nodes
                .into_iter()
                .partition(|(config, _)| config.depends_on.iter().all(|d| outputs.contains_key(d)));
            nodes = blocked;

            if ready.is_empty() {
                let stuck: Vec<&str> = nodes.iter().map(|(c, _)| c.agent_id.as_str()).collect();
                return Err(ConductorError::other(format!(
                    "dependency scheduling stalled with unfinished agents [{}]",
                    stuck.join(", ")
                )));
            }

            level += 1;
            log::info!(
                "level {}: executing [{}]",
                level,
                ready
                    .iter()
                    .map(|(c, _)| c.agent_id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            let runs = ready.iter().map(|(config, agent)| {
                let agent_input = dependency_input(input, &config.depends_on, &outputs);
                async move { self.run_agent(agent, &agent_input, context).await }
            });
            let level_results = join_all(runs).await;

            let mut failure = None;
            for ((config, _), result) in ready.iter().zip(level_results) {
                if result.success() {
                    outputs.insert(config.agent_id.clone(), result.output_data());
                } else if failure.is_none() {
                    failure = Some(format!(
                        "{} failed: {}",
                        config.agent_id,
                        result.error().unwrap_or("unknown error")
                    ));
                }
                results.push(result);
            }

            if let Some(error) = failure {
                log::error!("Stopping after level {}: {}", level, error);
                return Ok(DependencyOutcome {
                    success: false,
                    results,
                    error: Some(error),
                });
            }
        }

        Ok(DependencyOutcome {
            success: true,
            results,
            error: None,
        })
    }
}

/// First config per agent id wins
fn dedupe_configs(configs: &[DependencyConfig]) -> Vec<&DependencyConfig> {
    let mut seen = HashSet::new();
    configs
        .iter()
        .filter(|c| {
            let first = seen.insert(c.agent_id.as_str());
            if !first {
                log::warn!("Ignoring duplicate config for agent {}", c.agent_id);
            }
            first
        })
        .collect()
}

/// Input for a dependent agent: the run input plus `dependencies`, one
/// output per declared dependency in listed order
fn dependency_input(input: &Value, depends_on: &[String], outputs: &HashMap<String, Value>) -> Value {
    if depends_on.is_empty() {
        return input.clone();
    }

    let dependencies: Vec<Value> = depends_on
        .iter()
        .map(|d| outputs.get(d).cloned().unwrap_or(Value::Null))
        .collect();

    match input {
        Value::Object(map) => {
            let mut map = map.clone();
            map.insert("dependencies".to_string(), Value::Array(dependencies));
            Value::Object(map)
        }
        other => json!({
            "input": other,
            "dependencies": dependencies
        }),
    }
}
