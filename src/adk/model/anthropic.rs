// SPDX-License-Identifier: MIT

//! Anthropic family - messages API request shape and response normalization

use super::{ChatSettings, LlmResponse, Message, Prompt, Role, ToolCall};
use crate::adk::error::{ConductorError, Result};
use serde_json::{json, Value};

/// Build a messages API body
///
/// System messages are lifted into the top-level `system` field; consecutive
/// tool results are merged into one user turn as the API requires.
pub fn build_request(settings: &ChatSettings, prompt: &Prompt, tools: &[Value]) -> Value {
    let mut messages: Vec<Value> = Vec::new();

    for message in &prompt.messages {
        match message.role {
            Role::System => {}
            Role::Tool => {
                let block = json!({
                    "type": "tool_result",
                    "tool_use_id": message.tool_call_id.clone().unwrap_or_default(),
                    "content": message.content
                });

                let merged = messages.last_mut().and_then(|last| {
                    let is_result_turn = last["role"] == "user"
                        && last["content"]
                            .as_array()
                            .map(|blocks| blocks.iter().all(|b| b["type"] == "tool_result"))
                            .unwrap_or(false);
                    if is_result_turn {
                        last["content"].as_array_mut()
                    } else {
                        None
                    }
                });

                match merged {
                    Some(blocks) => blocks.push(block),
                    None => messages.push(json!({ "role": "user", "content": [block] })),
                }
            }
            _ => messages.push(message_to_anthropic(message)),
        }
    }

    let mut body = json!({
        "model": settings.model,
        "messages": messages,
        "temperature": settings.temperature,
        "max_tokens": settings.max_tokens
    });

    if let Some(system) = prompt.system_text() {
        body["system"] = json!(system);
    }

    if !tools.is_empty() {
        body["tools"] = json!(tools);
    }

    body
}

/// Convert a user or assistant Message to Anthropic message format
fn message_to_anthropic(message: &Message) -> Value {
    let role = match message.role {
        Role::Assistant => "assistant",
        _ => "user",
    };

    if message.tool_calls.is_empty() {
        return json!({ "role": role, "content": message.content });
    }

    let mut blocks = Vec::with_capacity(message.tool_calls.len() + 1);
    if !message.content.is_empty() {
        blocks.push(json!({ "type": "text", "text": message.content }));
    }
    for call in &message.tool_calls {
        blocks.push(json!({
            "type": "tool_use",
            "id": call.id,
            "name": call.name,
            "input": call.arguments
        }));
    }

    json!({ "role": role, "content": blocks })
}

/// Normalize `{content: [{type, text|...}], usage: {input_tokens, output_tokens}}`
pub fn normalize_response(response: &Value) -> Result<LlmResponse> {
    let blocks = response["content"]
        .as_array()
        .ok_or_else(|| ConductorError::InvalidResponse("No content in Anthropic response".into()))?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(t) = block["text"].as_str() {
                    text.push_str(t);
                }
            }
            Some("tool_use") => tool_calls.push(ToolCall {
                id: block["id"].as_str().unwrap_or_default().to_string(),
                name: block["name"].as_str().unwrap_or_default().to_string(),
                arguments: block["input"].clone(),
            }),
            _ => {}
        }
    }

    if let Some(stop_reason) = response["stop_reason"].as_str() {
        log::debug!("Anthropic stop reason: {}", stop_reason);
    }

    let usage = &response["usage"];
    let tokens_used = usage["input_tokens"].as_u64().unwrap_or(0)
        + usage["output_tokens"].as_u64().unwrap_or(0);

    Ok(LlmResponse {
        content: text,
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tokens_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ChatSettings {
        ChatSettings {
            model: "claude-sonnet".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    #[test]
    fn test_system_lifted_out_of_messages() {
        let prompt = Prompt::new(vec![Message::system("You are helpful"), Message::user("Hello")]);
        let body = build_request(&settings(), &prompt, &[]);

        assert_eq!(body["system"], "You are helpful");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_tool_results_merge_into_one_user_turn() {
        let a = ToolCall {
            id: "tu_1".to_string(),
            name: "a".to_string(),
            arguments: json!({}),
        };
        let b = ToolCall {
            id: "tu_2".to_string(),
            name: "b".to_string(),
            arguments: json!({}),
        };
        let prompt = Prompt::new(vec![
            Message::user("go"),
            Message::assistant_with_tool_calls("thinking", vec![a.clone(), b.clone()]),
            Message::tool_result(&a, "ra", json!({})),
            Message::tool_result(&b, "rb", json!({})),
        ]);
        let body = build_request(&settings(), &prompt, &[json!({"name": "a"})]);
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["content"][0]["type"], "text");
        assert_eq!(messages[1]["content"][1]["type"], "tool_use");
        assert_eq!(messages[2]["content"].as_array().unwrap().len(), 2);
        assert_eq!(messages[2]["content"][1]["tool_use_id"], "tu_2");
        assert_eq!(body["tools"][0]["name"], "a");
    }

    #[test]
    fn test_normalize_text_response() {
        let response = json!({
            "content": [{"type": "text", "text": "Hello, how can I help?"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 8}
        });

        let normalized = normalize_response(&response).unwrap();
        assert_eq!(normalized.content, "Hello, how can I help?");
        assert!(normalized.tool_calls.is_none());
        assert_eq!(normalized.tokens_used, 20);
    }

    #[test]
    fn test_normalize_lifts_tool_use_blocks() {
        let response = json!({
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "London"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 5, "output_tokens": 5}
        });

        let normalized = normalize_response(&response).unwrap();
        assert_eq!(normalized.content, "Let me check.");
        let calls = normalized.tool_calls.unwrap();
        assert_eq!(calls[0].id, "toolu_1");
        assert_eq!(calls[0].arguments["city"], "London");
    }

    #[test]
    fn test_normalize_without_content_fails() {
        assert!(normalize_response(&json!({"usage": {}})).is_err());
    }
}
