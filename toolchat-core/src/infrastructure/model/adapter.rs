//! Message adapters - convert between different API formats
//!
//! Besides plain text, each format has to carry the assistant's tool calls and the batch of
//! tool results that answers them.

use crate::types::{ChatMessage, MessageRole, ToolCall};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Adapter for converting messages to different API formats
pub struct MessageAdapter;

impl MessageAdapter {
    /// OpenAI chat format. Tool call arguments travel as a JSON string and each tool result
    /// becomes its own `tool` message carrying the call id.
    pub fn to_openai_format(messages: &[ChatMessage]) -> Vec<Value> {
        let mut formatted = Vec::with_capacity(messages.len());
        for msg in messages {
            match msg.role {
                MessageRole::Assistant if msg.has_tool_calls() => {
                    let calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments_value().to_string(),
                                }
                            })
                        })
                        .collect();
                    formatted.push(json!({
                        "role": "assistant",
                        "content": optional_text(&msg.content),
                        "tool_calls": calls,
                    }));
                }
                MessageRole::Tool => {
                    formatted.extend(msg.tool_results.iter().map(|result| {
                        json!({
                            "role": "tool",
                            "tool_call_id": result.call_id,
                            "content": result.content,
                        })
                    }));
                }
                role => formatted.push(json!({
                    "role": role.as_str(),
                    "content": msg.content.clone()
                })),
            }
        }
        formatted
    }

    /// Ollama format: like OpenAI, but arguments stay a JSON object and results are matched
    /// by tool name.
    pub fn to_ollama_format(messages: &[ChatMessage]) -> Vec<Value> {
        let mut formatted = Vec::with_capacity(messages.len());
        for msg in messages {
            match msg.role {
                MessageRole::Assistant if msg.has_tool_calls() => {
                    let calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments_value(),
                                }
                            })
                        })
                        .collect();
                    formatted.push(json!({
                        "role": "assistant",
                        "content": msg.content,
                        "tool_calls": calls,
                    }));
                }
                MessageRole::Tool => {
                    formatted.extend(msg.tool_results.iter().map(|result| {
                        json!({
                            "role": "tool",
                            "tool_name": result.name,
                            "content": result.content,
                        })
                    }));
                }
                role => formatted.push(json!({
                    "role": role.as_str(),
                    "content": msg.content.clone()
                })),
            }
        }
        formatted
    }

    /// Gemini format. Returns: (system_instruction_text, contents)
    ///
    /// The result batch is a single `user` content whose parts are `functionResponse`
    /// entries, in call order.
    pub fn to_gemini_format(messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => system_parts.push(message.content.clone()),
                MessageRole::User => contents.push(json!({
                    "role": "user",
                    "parts": [{"text": message.content.clone()}]
                })),
                MessageRole::Assistant => {
                    let mut parts = Vec::new();
                    if !message.content.trim().is_empty() || !message.has_tool_calls() {
                        parts.push(json!({"text": message.content.clone()}));
                    }
                    parts.extend(message.tool_calls.iter().map(|call| {
                        json!({
                            "functionCall": {
                                "name": call.name,
                                "args": call.arguments_value(),
                            }
                        })
                    }));
                    contents.push(json!({ "role": "model", "parts": parts }));
                }
                MessageRole::Tool => {
                    let parts: Vec<Value> = message
                        .tool_results
                        .iter()
                        .map(|result| {
                            let key = if result.is_error { "error" } else { "result" };
                            let mut response = Map::new();
                            response.insert(key.to_string(), json!(result.content));
                            json!({
                                "functionResponse": {
                                    "name": result.name,
                                    "response": response,
                                }
                            })
                        })
                        .collect();
                    contents.push(json!({ "role": "user", "parts": parts }));
                }
            }
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system_instruction, contents)
    }
}

fn optional_text(content: &str) -> Value {
    if content.is_empty() {
        Value::Null
    } else {
        Value::String(content.to_string())
    }
}

/// Builds a [`ToolCall`], minting an id when the backend does not supply one.
pub(crate) fn tool_call(id: Option<String>, name: String, arguments: Map<String, Value>) -> ToolCall {
    let id = id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("call_{}", Uuid::new_v4().simple()));
    ToolCall::new(id, name, arguments)
}

/// Arguments as sent by a backend: an object, a JSON string holding an object, or nothing.
pub(crate) fn argument_map(raw: Value) -> Result<Map<String, Value>, String> {
    match raw {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        Value::String(text) if text.trim().is_empty() => Ok(Map::new()),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(format!("tool arguments must be an object, got {other}")),
            Err(err) => Err(format!("tool arguments are not valid JSON: {err}")),
        },
        other => Err(format!("tool arguments must be an object, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolResult;

    fn conversation() -> Vec<ChatMessage> {
        let mut args = Map::new();
        args.insert("a".into(), json!(25));
        args.insert("b".into(), json!(4));
        vec![
            ChatMessage::new(MessageRole::System, "Be brief."),
            ChatMessage::new(MessageRole::User, "What is 25*4 and the weather in Paris?"),
            ChatMessage::assistant_with_calls(
                "",
                vec![
                    ToolCall::new("c1", "calculator", args),
                    ToolCall::new("c2", "get_weather", Map::new()),
                ],
            ),
            ChatMessage::tool_results(vec![
                ToolResult {
                    call_id: "c1".into(),
                    name: "calculator".into(),
                    content: "100".into(),
                    is_error: false,
                },
                ToolResult {
                    call_id: "c2".into(),
                    name: "get_weather".into(),
                    content: "Unknown city".into(),
                    is_error: true,
                },
            ]),
        ]
    }

    #[test]
    fn gemini_batches_results_into_one_content() {
        let (system, contents) = MessageAdapter::to_gemini_format(&conversation());
        assert_eq!(system.as_deref(), Some("Be brief."));
        assert_eq!(contents.len(), 3);

        let model_turn = &contents[1];
        assert_eq!(model_turn["role"], "model");
        assert_eq!(model_turn["parts"].as_array().map(Vec::len), Some(2));
        assert_eq!(model_turn["parts"][0]["functionCall"]["args"]["a"], 25);

        let results = &contents[2];
        assert_eq!(results["role"], "user");
        assert_eq!(results["parts"][0]["functionResponse"]["name"], "calculator");
        assert_eq!(results["parts"][0]["functionResponse"]["response"]["result"], "100");
        assert_eq!(results["parts"][1]["functionResponse"]["response"]["error"], "Unknown city");
    }

    #[test]
    fn openai_expands_results_per_call_id() {
        let formatted = MessageAdapter::to_openai_format(&conversation());
        assert_eq!(formatted.len(), 5);
        assert_eq!(formatted[2]["content"], Value::Null);
        assert_eq!(
            formatted[2]["tool_calls"][0]["function"]["arguments"],
            r#"{"a":25,"b":4}"#
        );
        assert_eq!(formatted[3]["role"], "tool");
        assert_eq!(formatted[3]["tool_call_id"], "c1");
        assert_eq!(formatted[4]["tool_call_id"], "c2");
    }

    #[test]
    fn ollama_keeps_arguments_as_objects() {
        let formatted = MessageAdapter::to_ollama_format(&conversation());
        assert_eq!(formatted[2]["tool_calls"][0]["function"]["arguments"]["b"], 4);
        assert_eq!(formatted[4]["tool_name"], "get_weather");
    }

    #[test]
    fn argument_strings_are_decoded() {
        let map = argument_map(json!(r#"{"city":"Paris"}"#)).expect("object");
        assert_eq!(map["city"], "Paris");
        assert!(argument_map(json!("")).expect("empty").is_empty());
        assert!(argument_map(json!("[1]")).is_err());
        assert!(argument_map(json!("{broken")).is_err());
    }

    #[test]
    fn missing_ids_are_generated() {
        let first = tool_call(None, "x".into(), Map::new());
        let second = tool_call(Some(" ".into()), "x".into(), Map::new());
        assert!(first.id.starts_with("call_"));
        assert_ne!(first.id, second.id);
        assert_eq!(tool_call(Some("abc".into()), "x".into(), Map::new()).id, "abc");
    }
}
