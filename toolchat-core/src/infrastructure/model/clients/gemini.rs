//! Gemini client implementation

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelProviderConfig;
use crate::constants::DEFAULT_GEMINI_API_PATH;
use crate::infrastructure::model::adapter::{MessageAdapter, argument_map, tool_call};
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::ModelClient;
use crate::infrastructure::model::types::{ModelError, ModelRequest, ModelResponse};

/// Gemini client for Google AI
#[derive(Clone)]
pub struct GeminiClient {
    base: HttpClientBase,
    api_path: String,
}

impl GeminiClient {
    pub fn from_config(config: &ModelProviderConfig, timeout: Option<Duration>) -> Self {
        let api_key = resolve_api_key(config);
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), api_key, timeout),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_API_PATH.to_string()),
        }
    }

    fn build_model_url(&self, model: &str) -> String {
        let base = self.base.endpoint.trim_end_matches('/');
        let path = self.api_path.trim_matches('/');
        format!("{base}/{path}/{model}:generateContent")
    }

    fn build_payload(request: &ModelRequest) -> Value {
        let (system_text, contents) = MessageAdapter::to_gemini_format(&request.messages);

        let mut payload = json!({ "contents": contents });

        if !request.tools.is_empty() {
            payload["tools"] = json!([{ "functionDeclarations": request.tools }]);
        }

        if let Some(system) = system_text {
            payload["system_instruction"] = json!({
                "parts": [{"text": system}]
            });
        }
        payload
    }

    fn parse_response(
        &self,
        response: GeminiResponse,
        session_id: Option<String>,
    ) -> Result<ModelResponse, ModelError> {
        let parts = response
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing candidate content"))?;

        let mut text = Vec::new();
        let mut calls = Vec::new();
        for part in parts {
            if let Some(call) = part.function_call {
                let arguments = argument_map(call.args)
                    .map_err(|reason| ModelError::invalid_response(&self.base.id, reason))?;
                calls.push(tool_call(None, call.name, arguments));
            } else if let Some(fragment) = part.text {
                text.push(fragment);
            }
        }

        if calls.is_empty() && text.is_empty() {
            return Err(ModelError::invalid_response(&self.base.id, "missing text"));
        }
        Ok(ModelResponse::with_tool_calls(text.concat(), calls, session_id))
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.build_model_url(&request.model);
        let payload = Self::build_payload(&request);

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to Gemini"
        );

        let response: GeminiResponse = self.base.post_with_query_key(&url, &payload).await?;
        let response = self.parse_response(response, request.session_id)?;
        debug!(tool_calls = response.tool_calls().len(), "Received response from Gemini");
        Ok(response)
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}
