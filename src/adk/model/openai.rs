// SPDX-License-Identifier: MIT

//! OpenAI family - chat completions request shape and response normalization

use super::{ChatSettings, LlmResponse, Message, Prompt, Role, ToolCall};
use crate::adk::error::{ConductorError, Result};
use serde_json::{json, Value};

/// Build a chat completions body
///
/// `functions` are the agent's tools already projected into the
/// `{type: "function", function: {...}}` declaration shape.
pub fn build_request(settings: &ChatSettings, prompt: &Prompt, functions: &[Value]) -> Value {
    let messages: Vec<Value> = prompt.messages.iter().map(message_to_openai).collect();

    let mut body = json!({
        "model": settings.model,
        "messages": messages,
        "temperature": settings.temperature,
        "max_tokens": settings.max_tokens
    });

    if !functions.is_empty() {
        body["tools"] = json!(functions);
        body["tool_choice"] = json!("auto");
    }

    body
}

/// Convert internal Message to OpenAI message format
fn message_to_openai(message: &Message) -> Value {
    match message.role {
        Role::System => json!({ "role": "system", "content": message.content }),
        Role::User => json!({ "role": "user", "content": message.content }),
        Role::Tool => json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id.clone().unwrap_or_default(),
            "content": message.content
        }),
        Role::Assistant if message.tool_calls.is_empty() => {
            json!({ "role": "assistant", "content": message.content })
        }
        Role::Assistant => {
            let tool_calls: Vec<Value> = message
                .tool_calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id,
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": serde_json::to_string(&call.arguments).unwrap_or_default()
                        }
                    })
                })
                .collect();

            json!({
                "role": "assistant",
                "content": if message.content.is_empty() { Value::Null } else { json!(message.content) },
                "tool_calls": tool_calls
            })
        }
    }
}

/// Normalize `{choices: [{message: {content, tool_calls?}}], usage: {total_tokens}}`
pub fn normalize_response(response: &Value) -> Result<LlmResponse> {
    let choice = response["choices"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| ConductorError::InvalidResponse("No choices in OpenAI response".into()))?;

    let message = &choice["message"];
    let content = message["content"].as_str().unwrap_or_default().to_string();

    let tool_calls = message["tool_calls"].as_array().map(|calls| {
        calls
            .iter()
            .map(|tc| {
                let args_str = tc["function"]["arguments"].as_str().unwrap_or("{}");
                ToolCall {
                    id: tc["id"].as_str().unwrap_or_default().to_string(),
                    name: tc["function"]["name"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    arguments: serde_json::from_str(args_str).unwrap_or(json!({})),
                }
            })
            .collect::<Vec<_>>()
    });

    Ok(LlmResponse {
        content,
        tool_calls,
        tokens_used: response["usage"]["total_tokens"].as_u64().unwrap_or(0),
    })
}
