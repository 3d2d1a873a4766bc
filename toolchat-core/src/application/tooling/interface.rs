use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::error::ToolInvokeError;

/// A tool as advertised by `tools/list`. The schema is kept raw; translation happens on the
/// model side.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptArgumentInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<PromptArgumentInfo>,
}

/// A rendered prompt, its text messages joined in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessages {
    pub description: Option<String>,
    pub text: String,
}

/// Result of `tools/call`. A tool that failed on the server side still produces an outcome,
/// flagged with `is_error`.
#[derive(Debug, Clone)]
pub struct ToolCallOutcome {
    pub is_error: bool,
    pub message: Option<String>,
    pub output: Value,
}

impl ToolCallOutcome {
    pub fn from_result(output: Value) -> Self {
        let is_error = output
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let message = extract_tool_message(&output);
        Self {
            is_error,
            message,
            output,
        }
    }

    /// Text handed back to the model.
    pub fn text(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.output.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ToolList {
    #[serde(default)]
    tools: Vec<ServerToolInfo>,
}

#[derive(Deserialize)]
struct ResourceList {
    #[serde(default)]
    resources: Vec<ResourceInfo>,
}

#[derive(Deserialize)]
struct ResourceRead {
    #[serde(default)]
    contents: Vec<ResourceContent>,
}

#[derive(Deserialize)]
struct PromptList {
    #[serde(default)]
    prompts: Vec<PromptInfo>,
}

#[derive(Deserialize)]
struct PromptGet {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    messages: Vec<PromptMessage>,
}

#[derive(Deserialize)]
struct PromptMessage {
    #[serde(default)]
    content: Value,
}

/// Connection to one MCP server. Implementors only provide the raw request path; the typed
/// operations are built on top of it.
#[async_trait]
pub trait ToolServerInterface: Send + Sync {
    fn server_name(&self) -> &str;

    /// Sends one JSON-RPC request and returns its `result` member.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError>;

    async fn server_instructions(&self) -> Option<String>;

    async fn list_tools(&self) -> Result<Vec<ServerToolInfo>, ToolInvokeError> {
        let result = self.request("tools/list", json!({})).await?;
        let list: ToolList = decode(self.server_name(), result)?;
        Ok(list.tools)
    }

    async fn invoke_tool(
        &self,
        tool: &str,
        arguments: Value,
    ) -> Result<ToolCallOutcome, ToolInvokeError> {
        let params = json!({
            "name": tool,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });
        let result = self.request("tools/call", params).await?;
        Ok(ToolCallOutcome::from_result(result))
    }

    async fn list_resources(&self) -> Result<Vec<ResourceInfo>, ToolInvokeError> {
        let result = self.request("resources/list", json!({})).await?;
        let list: ResourceList = decode(self.server_name(), result)?;
        Ok(list.resources)
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContent>, ToolInvokeError> {
        let result = self.request("resources/read", json!({ "uri": uri })).await?;
        let read: ResourceRead = decode(self.server_name(), result)?;
        Ok(read.contents)
    }

    async fn list_prompts(&self) -> Result<Vec<PromptInfo>, ToolInvokeError> {
        let result = self.request("prompts/list", json!({})).await?;
        let list: PromptList = decode(self.server_name(), result)?;
        Ok(list.prompts)
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<PromptMessages, ToolInvokeError> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request("prompts/get", params).await?;
        let prompt: PromptGet = decode(self.server_name(), result)?;
        let text = prompt
            .messages
            .iter()
            .filter_map(|message| message.content.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(PromptMessages {
            description: prompt.description,
            text,
        })
    }
}

fn decode<T: DeserializeOwned>(server: &str, value: Value) -> Result<T, ToolInvokeError> {
    serde_json::from_value(value).map_err(|source| ToolInvokeError::InvalidJson {
        server: server.to_string(),
        source,
    })
}

/// First non-empty text block of a `tools/call` result, falling back to
/// `structuredContent.error.message`.
pub fn extract_tool_message(result: &Value) -> Option<String> {
    if let Some(array) = result.get("content").and_then(Value::as_array) {
        for block in array {
            if block
                .get("type")
                .and_then(Value::as_str)
                .map(|value| value.eq_ignore_ascii_case("text"))
                .unwrap_or(false)
            {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }
    }

    if let Some(structured) = result.get("structuredContent").and_then(Value::as_object) {
        if let Some(error) = structured.get("error").and_then(Value::as_object) {
            if let Some(message) = error.get("message").and_then(Value::as_str) {
                let trimmed = message.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }

    None
}
