// SPDX-License-Identifier: MIT

//! Running a parsed workflow with the strategy its type implies

use super::{AgentExecutor, DependencyConfig};
use crate::adk::agent::Agent;
use crate::adk::error::{ConductorError, Result};
use crate::conductor::context::ExecutionContext;
use crate::conductor::registry::AgentRegistry;
use crate::conductor::result::{
    AgentRunResult, DependencyOutcome, ParallelOutcome, PlanOutcome, SequentialOutcome,
    StageOutcome,
};
use crate::conductor::workflow::{
    AgentSlot, ExecutionOrder, ExecutionStrategy, WorkflowDefinition, WorkflowParser, WorkflowType,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

impl AgentExecutor {
    /// Execute a workflow end to end.
    ///
    /// Sequential and parallel workflows whose slots declare `dependsOn` run
    /// through [`execute_with_dependencies`](Self::execute_with_dependencies).
    /// Conditional workflows run the entry agent, then the fallback if the
    /// entry agent fails. Mixed workflows run stage by stage, each stage
    /// receiving the previous stage's aggregate output.
    pub async fn execute_plan(
        &self,
        workflow: &WorkflowDefinition,
        registry: &dyn AgentRegistry,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<PlanOutcome> {
        log::info!(
            "Running {} workflow '{}' (execution {})",
            workflow.workflow_type,
            workflow.name,
            context.execution_id()
        );

        let uses_dependencies = matches!(
            workflow.workflow_type,
            WorkflowType::Sequential | WorkflowType::Parallel
        ) && workflow.agents.iter().any(|s| !s.depends_on.is_empty());

        let stages = if uses_dependencies {
            let configs: Vec<DependencyConfig> = first_slots(&workflow.agents)
                .into_iter()
                .map(|slot| DependencyConfig {
                    agent_id: slot.agent_id.clone(),
                    depends_on: slot.depends_on.clone(),
                })
                .collect();
            let outcome = self
                .execute_with_dependencies(&configs, registry, input, context)
                .await?;
            vec![dependency_stage(outcome, &configs)]
        } else {
            match WorkflowParser::get_execution_order(workflow) {
                ExecutionOrder::Sequential(ids) => {
                    let agents = resolve(registry, &ids).await?;
                    vec![sequential_stage(
                        self.execute_sequential(&agents, input, context).await,
                    )]
                }
                ExecutionOrder::Parallel(batches) => {
                    let ids: Vec<String> = batches.into_iter().flatten().collect();
                    let agents = resolve(registry, &ids).await?;
                    vec![parallel_stage(
                        self.execute_parallel(&agents, input, context).await,
                    )]
                }
                ExecutionOrder::Conditional(entry) => {
                    let entry = entry.into_iter().next().ok_or_else(|| {
                        ConductorError::workflow("conditional workflow has no entry agent")
                    })?;
                    vec![
                        self.run_conditional(&entry, workflow.flow.fallback.as_deref(), registry, input, context)
                            .await?,
                    ]
                }
                ExecutionOrder::Mixed(stages) => {
                    if stages.is_empty() {
                        return Err(ConductorError::workflow("mixed workflow has no stages"));
                    }

                    let mut outcomes = Vec::with_capacity(stages.len());
                    let mut current = input.clone();
                    for (index, stage) in stages.iter().enumerate() {
                        let agents = resolve(registry, &stage.agents).await?;
                        log::info!(
                            "stage {}: {} agents, {}",
                            index,
                            agents.len(),
                            stage.kind.as_str()
                        );

                        let outcome = match stage.kind {
                            ExecutionStrategy::Sequential => sequential_stage(
                                self.execute_sequential(&agents, &current, context).await,
                            ),
                            ExecutionStrategy::Parallel => parallel_stage(
                                self.execute_parallel(&agents, &current, context).await,
                            ),
                        };

                        let failed = !outcome.success;
                        current = outcome.output.clone();
                        outcomes.push(outcome);
                        if failed {
                            break;
                        }
                    }
                    outcomes
                }
            }
        };

        let success = stages.iter().all(|s| s.success);
        let error = stages.iter().find_map(|s| s.error.clone());
        let final_output = stages.last().map(|s| s.output.clone()).unwrap_or(Value::Null);

        Ok(PlanOutcome {
            workflow_id: workflow.id.clone().unwrap_or_default(),
            success,
            stages,
            final_output,
            error,
        })
    }

    /// Entry agent, then the fallback with the same input if the entry fails
    async fn run_conditional(
        &self,
        entry: &str,
        fallback: Option<&str>,
        registry: &dyn AgentRegistry,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<StageOutcome> {
        let entry_agent = resolve_one(registry, entry).await?;
        let mut results = vec![self.run_agent(&entry_agent, input, context).await];

        if let Some(fallback) = fallback.filter(|f| *f != entry) {
            if !results[0].success() {
                log::warn!("Entry agent {} failed, running fallback {}", entry, fallback);
                let fallback_agent = resolve_one(registry, fallback).await?;
                results.push(self.run_agent(&fallback_agent, input, context).await);
            }
        }

        Ok(single_stage(results))
    }
}

/// Slots in declaration order, first occurrence of each agent id only
fn first_slots(slots: &[AgentSlot]) -> Vec<&AgentSlot> {
    let mut seen = HashSet::new();
    slots
        .iter()
        .filter(|s| seen.insert(s.agent_id.as_str()))
        .collect()
}

async fn resolve_one(registry: &dyn AgentRegistry, agent_id: &str) -> Result<Arc<Agent>> {
    registry
        .get(agent_id)
        .await
        .ok_or_else(|| ConductorError::agent_not_found(agent_id))
}

/// Look up every id, skipping repeats of an id already resolved
async fn resolve(registry: &dyn AgentRegistry, ids: &[String]) -> Result<Vec<Arc<Agent>>> {
    let mut seen = HashSet::new();
    let mut agents = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            log::warn!("Agent {} listed more than once; keeping the first", id);
            continue;
        }
        agents.push(resolve_one(registry, id).await?);
    }
    Ok(agents)
}

fn sequential_stage(outcome: SequentialOutcome) -> StageOutcome {
    StageOutcome {
        kind: "sequential".to_string(),
        success: outcome.success,
        output: outcome.final_output(),
        results: outcome.results,
        error: outcome.error,
    }
}

fn parallel_stage(outcome: ParallelOutcome) -> StageOutcome {
    let error = outcome.failed.first().map(|r| {
        format!(
            "{} failed: {}",
            r.agent_id,
            r.error().unwrap_or("unknown error")
        )
    });

    StageOutcome {
        kind: "parallel".to_string(),
        success: outcome.success,
        output: Value::Array(outcome.outputs),
        results: outcome.successful.into_iter().chain(outcome.failed).collect(),
        error,
    }
}

/// The output is the sink agent's output (the agent nothing depends on), or
/// an array of sink outputs in declaration order when there are several.
/// Sinks that did not run are left out.
fn dependency_stage(outcome: DependencyOutcome, configs: &[DependencyConfig]) -> StageOutcome {
    let depended_on: HashSet<&str> = configs
        .iter()
        .flat_map(|c| c.depends_on.iter().map(String::as_str))
        .collect();
    let mut sink_outputs: Vec<Value> = configs
        .iter()
        .filter(|c| !depended_on.contains(c.agent_id.as_str()))
        .filter_map(|c| outcome.result_for(&c.agent_id))
        .map(|r| r.output_data())
        .collect();

    let output = match sink_outputs.len() {
        0 => Value::Null,
        1 => sink_outputs.remove(0),
        _ => Value::Array(sink_outputs),
    };

    StageOutcome {
        kind: "dependencies".to_string(),
        success: outcome.success,
        output,
        results: outcome.results,
        error: outcome.error,
    }
}

fn single_stage(results: Vec<AgentRunResult>) -> StageOutcome {
    let last = results.last();
    let success = last.map_or(false, |r| r.success());
    let output = last.map(|r| r.output_data()).unwrap_or(Value::Null);
    let error = if success {
        None
    } else {
        last.map(|r| format!("{} failed: {}", r.agent_id, r.error().unwrap_or("unknown error")))
    };

    StageOutcome {
        kind: "single".to_string(),
        success,
        output,
        results,
        error,
    }
}
