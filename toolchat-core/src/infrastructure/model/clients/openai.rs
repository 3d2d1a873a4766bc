//! OpenAI-compatible client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelProviderConfig;
use crate::constants::DEFAULT_OPENAI_API_PATH;
use crate::infrastructure::model::adapter::{MessageAdapter, argument_map, tool_call};
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::ModelClient;
use crate::infrastructure::model::types::{ModelError, ModelRequest, ModelResponse};

/// OpenAI-compatible client (works with OpenAI, Mistral, Groq, etc.)
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    api_path: String,
}

impl OpenAIClient {
    pub fn from_config(config: &ModelProviderConfig, timeout: Option<Duration>) -> Self {
        let api_key = resolve_api_key(config);
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), api_key, timeout),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_API_PATH.to_string()),
        }
    }

    fn build_payload(request: &ModelRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: request.model.clone(),
            messages: MessageAdapter::to_openai_format(&request.messages),
            tools: request.tools.iter().map(|tool| tool.to_openai_tool()).collect(),
            stream: false,
        }
    }

    fn parse_response(
        &self,
        response: OpenAIResponse,
        session_id: Option<String>,
    ) -> Result<ModelResponse, ModelError> {
        let message = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing message"))?;

        let mut calls = Vec::with_capacity(message.tool_calls.len());
        for call in message.tool_calls {
            let arguments = argument_map(call.function.arguments)
                .map_err(|reason| ModelError::invalid_response(&self.base.id, reason))?;
            calls.push(tool_call(call.id, call.function.name, arguments));
        }

        let content = message.content.unwrap_or_default();
        if calls.is_empty() && content.is_empty() {
            return Err(ModelError::invalid_response(&self.base.id, "missing content"));
        }
        Ok(ModelResponse::with_tool_calls(content, calls, session_id))
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let payload = Self::build_payload(&request);

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: OpenAIResponse = self.base.post_with_bearer(&url, &payload).await?;
        let response = self.parse_response(response, request.session_id)?;
        debug!(
            tool_calls = response.tool_calls().len(),
            "Received response from OpenAI-compatible provider"
        );
        Ok(response)
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAIToolCall>,
}

#[derive(Deserialize)]
struct OpenAIToolCall {
    id: Option<String>,
    function: OpenAIFunctionCall,
}

#[derive(Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{ObjectSchema, PropertySchema, ToolDeclaration};
    use crate::infrastructure::model::declaration::translate;
    use crate::types::{ChatMessage, MessageRole, ToolCall, ToolResult};
    use serde_json::{Map, json};

    fn client() -> OpenAIClient {
        OpenAIClient::from_config(
            &ModelProviderConfig {
                id: "openai".into(),
                provider_type: "openai".into(),
                endpoint: "https://api.openai.com".into(),
                api_key: None,
                api_path: None,
                models: vec![],
            },
            None,
        )
    }

    #[test]
    fn payload_lists_tools_and_expands_results() {
        let schema =
            ObjectSchema::new([("a", PropertySchema::number("A"))], ["a"]).expect("schema");
        let request = ModelRequest {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            messages: vec![
                ChatMessage::new(MessageRole::User, "double 2"),
                ChatMessage::assistant_with_calls("", vec![ToolCall::new("call_1", "double", Map::new())]),
                ChatMessage::tool_results(vec![ToolResult {
                    call_id: "call_1".into(),
                    name: "double".into(),
                    content: "4".into(),
                    is_error: false,
                }]),
            ],
            tools: vec![translate(&ToolDeclaration::new("double", "Doubles a", schema))],
            session_id: None,
        };
        let payload = serde_json::to_value(OpenAIClient::build_payload(&request)).expect("json");
        assert_eq!(payload["tools"][0]["function"]["name"], "double");
        assert_eq!(payload["messages"].as_array().map(Vec::len), Some(3));
        assert_eq!(payload["messages"][2]["tool_call_id"], "call_1");
        assert_eq!(payload["stream"], false);
    }

    #[test]
    fn string_arguments_are_decoded_into_calls() {
        let raw: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "calculator", "arguments": "{\"operation\":\"add\",\"a\":1,\"b\":2}"}
                    }]
                }
            }]
        }))
        .expect("response");
        let response = client().parse_response(raw, None).expect("parsed");
        let call = &response.tool_calls()[0];
        assert_eq!(call.id, "call_abc");
        assert_eq!(call.arguments["operation"], "add");
    }

    #[test]
    fn malformed_arguments_are_an_invalid_response() {
        let raw: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {"tool_calls": [{"id": "x", "function": {"name": "f", "arguments": "{oops"}}]}}]
        }))
        .expect("response");
        assert!(matches!(
            client().parse_response(raw, None),
            Err(ModelError::InvalidResponse { .. })
        ));
    }
}
