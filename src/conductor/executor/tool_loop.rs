// SPDX-License-Identifier: MIT

//! The tool-calling loop
//!
//! ```text
//! AWAIT_LLM --no tool calls--------------> DONE_OK
//! AWAIT_LLM --tool calls, iteration < max-> RUN_TOOLS -> AWAIT_LLM
//! AWAIT_LLM --iteration == max-----------> DONE_WARN
//! AWAIT_LLM --provider error-------------> DONE_ERROR
//! ```

use super::AgentExecutor;
use crate::adk::agent::{Agent, AgentOutput, ExecutionResult, MAX_ITERATIONS_WARNING};
use crate::adk::model::{LlmResponse, Message, ToolCall};
use crate::adk::tool::{ToolOutcome, ToolResultRecord};
use crate::conductor::context::ExecutionContext;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::time::Instant;
use uuid::Uuid;

/// Inline tool request markup: `<tool_call>{"name": ..., "arguments": {...}}</tool_call>`
static TOOL_CALL_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<tool_call>\s*(.*?)\s*</tool_call>").expect("tool call pattern is valid")
});

impl AgentExecutor {
    /// Drive `agent` through LLM/tool round-trips until it answers without
    /// requesting tools or the iteration cap is reached.
    pub async fn execute_with_tools(
        &self,
        agent: &Agent,
        input: &Value,
        context: &ExecutionContext,
    ) -> ExecutionResult {
        let started = Instant::now();
        let max = self.settings.max_tool_iterations;

        if let Err(e) = agent.ensure_tools().await {
            return ExecutionResult::failed(e.to_string()).with_duration(started.elapsed());
        }

        let mut prompt = agent.build_prompt(input, Some(context));
        let mut tokens_used = 0u64;
        let mut tool_results: Vec<ToolResultRecord> = Vec::new();
        let mut last_content = String::new();
        let mut iteration = 0u32;

        while iteration < max {
            log::info!("Agent {} iteration {}/{}", agent.name(), iteration + 1, max);

            let response = match agent.call_llm(&prompt).await {
                Ok(response) => response,
                Err(e) => {
                    log::error!("Agent {} LLM call failed: {}", agent.name(), e);
                    return ExecutionResult {
                        success: false,
                        error: Some(e.to_string()),
                        tokens_used,
                        iterations: Some(iteration),
                        tool_results,
                        ..Default::default()
                    }
                    .with_duration(started.elapsed());
                }
            };
            tokens_used += response.tokens_used;

            let calls = Self::detect_tool_calls(&response);
            if calls.is_empty() {
                return ExecutionResult {
                    success: true,
                    output: Some(AgentOutput::from_content(&response.content)),
                    tokens_used,
                    iterations: Some(iteration + 1),
                    tool_results,
                    ..Default::default()
                }
                .with_duration(started.elapsed());
            }

            log::debug!(
                "Agent {} requested tools: {:?}",
                agent.name(),
                calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
            );
            prompt.push(Message::assistant_with_tool_calls(
                response.content.clone(),
                calls.clone(),
            ));

            // Calls within one round are independent of each other
            let outcomes = join_all(
                calls
                    .iter()
                    .map(|call| agent.execute_tool(&call.name, call.arguments.clone())),
            )
            .await;

            for (call, outcome) in calls.iter().zip(outcomes) {
                let payload = Self::handle_tool_result(&outcome);
                prompt.push(Message::tool_result(call, payload.to_string(), payload));
                tool_results.push(ToolResultRecord::from_outcome(&call.name, &outcome));
            }

            last_content = response.content;
            iteration += 1;
        }

        log::warn!(
            "Agent {} stopped after {} tool iterations",
            agent.name(),
            max
        );
        ExecutionResult {
            success: true,
            output: Some(AgentOutput::from_content(&last_content)),
            tokens_used,
            iterations: Some(max),
            tool_results,
            warning: Some(MAX_ITERATIONS_WARNING.to_string()),
            ..Default::default()
        }
        .with_duration(started.elapsed())
    }

    /// Provider-native tool calls, else `<tool_call>` markup in the content
    pub fn detect_tool_calls(response: &LlmResponse) -> Vec<ToolCall> {
        if let Some(calls) = &response.tool_calls {
            if !calls.is_empty() {
                return calls.clone();
            }
        }

        TOOL_CALL_TAG
            .captures_iter(&response.content)
            .filter_map(|caps| {
                let body: Value = serde_json::from_str(caps.get(1)?.as_str()).ok()?;
                let name = body.get("name")?.as_str()?.to_string();
                let arguments = body
                    .get("arguments")
                    .or_else(|| body.get("parameters"))
                    .cloned()
                    .unwrap_or_else(|| json!({}));
                let id = body
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
                Some(ToolCall {
                    id,
                    name,
                    arguments,
                })
            })
            .collect()
    }

    /// The payload the model sees for one tool outcome
    pub fn handle_tool_result(outcome: &ToolOutcome) -> Value {
        if outcome.success {
            json!({
                "success": true,
                "data": outcome.result.clone().unwrap_or(Value::Null)
            })
        } else {
            json!({
                "error": true,
                "message": outcome.error.clone().unwrap_or_else(|| "Tool execution failed".to_string())
            })
        }
    }
}
