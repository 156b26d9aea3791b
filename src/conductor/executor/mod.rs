// SPDX-License-Identifier: MIT

//! Agent executor - the scheduler
//!
//! - [tool_loop] - bounded LLM/tool round-trips for one agent
//! - [strategy] - sequential, parallel and dependency-level composition
//! - [plan] - drives a parsed workflow with the strategy its type implies
//!
//! All concurrency is cooperative: batches are joined with
//! `futures::future::join_all` on the caller's task, never spawned.

mod plan;
mod strategy;
mod tool_loop;

pub use strategy::DependencyConfig;

use crate::adk::agent::{Agent, ExecutionResult};
use crate::adk::error::{ConductorError, Result};
use crate::conductor::config::ExecutorSettings;
use crate::conductor::context::ExecutionContext;
use crate::conductor::result::AgentRunResult;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

pub struct AgentExecutor {
    settings: ExecutorSettings,
}

impl AgentExecutor {
    pub fn new() -> Self {
        Self::with_settings(ExecutorSettings::default())
    }

    pub fn with_settings(settings: ExecutorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Run one agent. `None` is a caller error; every failure of the agent
    /// itself comes back as an unsuccessful [`AgentRunResult`].
    pub async fn execute_agent(
        &self,
        agent: Option<&Agent>,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<AgentRunResult> {
        let agent = agent.ok_or(ConductorError::AgentRequired)?;
        Ok(self.run_agent(agent, input, context).await)
    }

    /// Timeout, panic isolation and context recording around one agent run
    pub(crate) async fn run_agent(
        &self,
        agent: &Agent,
        input: &Value,
        context: &ExecutionContext,
    ) -> AgentRunResult {
        let started = Instant::now();
        log::info!("Executing agent {} ({})", agent.name(), agent.id());

        let work = AssertUnwindSafe(self.dispatch(agent, input, context)).catch_unwind();
        let mut execution = match tokio::time::timeout(self.settings.execution_timeout(), work).await
        {
            Ok(Ok(Ok(execution))) => execution,
            Ok(Ok(Err(e))) => ExecutionResult::failed(e.to_string()),
            Ok(Err(panic)) => {
                ExecutionResult::failed(format!("Agent panicked: {}", panic_message(panic.as_ref())))
            }
            Err(_) => ExecutionResult::failed(
                ConductorError::Timeout {
                    agent_id: agent.id().to_string(),
                    after_ms: self.settings.execution_timeout_ms,
                }
                .to_string(),
            ),
        };
        execution.duration_ms = started.elapsed().as_millis() as u64;

        match (&execution.output, execution.success) {
            (Some(output), true) => {
                context.add_agent_output(agent.id(), agent.name(), output.clone());
                log::info!(
                    "Agent {} finished in {}ms ({} tokens)",
                    agent.name(),
                    execution.duration_ms,
                    execution.tokens_used
                );
            }
            (None, true) => log::info!("Agent {} finished without output", agent.name()),
            (_, false) => log::error!(
                "Agent {} failed: {}",
                agent.name(),
                execution.error.as_deref().unwrap_or("unknown error")
            ),
        }

        AgentRunResult::new(agent.id(), agent.name(), execution)
    }

    /// Load tools on first use, then pick the single-shot or tool-loop path
    async fn dispatch(
        &self,
        agent: &Agent,
        input: &Value,
        context: &ExecutionContext,
    ) -> Result<ExecutionResult> {
        let tools = agent.ensure_tools().await?;
        if tools.is_empty() {
            Ok(agent.execute(input, Some(context)).await)
        } else {
            Ok(self.execute_with_tools(agent, input, context).await)
        }
    }
}

impl Default for AgentExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::adk::agent::AgentOutput;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_execute_agent_requires_agent() {
        let executor = AgentExecutor::new();
        let err = executor
            .execute_agent(None, &Value::Null, &ExecutionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConductorError::AgentRequired));
    }

    #[tokio::test]
    async fn test_execute_agent_records_output_in_context() {
        let executor = AgentExecutor::new();
        let ctx = ExecutionContext::new();
        let agent = agent("1", Arc::new(ScriptedLlm::new(vec![openai_text("hello", 4)])));

        let result = executor
            .execute_agent(Some(agent.as_ref()), &Value::from("hi"), &ctx)
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.agent_id, "1");
        assert_eq!(result.agent_name, "Agent 1");
        assert_eq!(result.output(), Some(&AgentOutput::Text("hello".into())));
        assert_eq!(ctx.latest_output("1"), Some(AgentOutput::Text("hello".into())));
    }

    #[tokio::test]
    async fn test_failed_agent_is_not_recorded() {
        let executor = AgentExecutor::new();
        let ctx = ExecutionContext::new();
        let agent = agent("1", Arc::new(FailingLlm));

        let result = executor
            .execute_agent(Some(agent.as_ref()), &Value::from("hi"), &ctx)
            .await
            .unwrap();

        assert!(!result.success());
        assert!(result.error().unwrap().contains("rate limited"));
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_provider_surfaces_as_failure() {
        let executor = AgentExecutor::new();
        let mut cfg = config("1");
        cfg.model_provider = "gemini".to_string();
        let agent = Agent::new(cfg, Arc::new(EchoLlm));

        let result = executor
            .execute_agent(Some(&agent), &Value::from("hi"), &ExecutionContext::new())
            .await
            .unwrap();
        assert!(!result.success());
        assert!(result.error().unwrap().contains("Unsupported model provider: gemini"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_failure_result() {
        let executor = AgentExecutor::with_settings(
            ExecutorSettings::default().with_execution_timeout(Duration::from_millis(20)),
        );
        let agent = agent("slow", Arc::new(SlowLlm(Duration::from_secs(5))));

        let result = executor
            .execute_agent(Some(agent.as_ref()), &Value::from("hi"), &ExecutionContext::new())
            .await
            .unwrap();

        assert!(!result.success());
        assert_eq!(
            result.error(),
            Some("Agent 'slow' timed out after 20ms")
        );
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
