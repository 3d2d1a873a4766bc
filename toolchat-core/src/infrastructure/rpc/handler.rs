use super::types::{RESOURCE_NOT_FOUND, RpcRequest, RpcResponse};
use crate::application::dispatcher::{DispatchError, Dispatcher, ErrorKind};
use crate::constants::PROTOCOL_VERSION;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Name and version reported in the `initialize` handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Maps MCP methods onto the [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct McpHandler {
    dispatcher: Arc<Dispatcher>,
    info: ServerInfo,
    instructions: Option<String>,
}

impl McpHandler {
    pub fn new(dispatcher: Arc<Dispatcher>, info: ServerInfo) -> Self {
        Self {
            dispatcher,
            info,
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Decodes one line of input and handles it. Returns the response to write, if any.
    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!(%err, "Unparsable JSON-RPC message");
                return Some(RpcResponse::parse_error(format!("Parse error: {err}")));
            }
        };
        let id = value.get("id").cloned();
        match serde_json::from_value::<RpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                warn!(%err, "Malformed JSON-RPC request");
                id.map(|id| RpcResponse::invalid_request(Some(id), format!("Invalid request: {err}")))
            }
        }
    }

    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!(method = %request.method, "Received JSON-RPC message");

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }
        let id = request.id.clone();

        if request.jsonrpc != "2.0" {
            return Some(RpcResponse::invalid_request(
                id,
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }

        let params = match request.params {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Some(RpcResponse::invalid_params(id, "params must be an object"));
            }
        };

        let response = match request.method.as_str() {
            "initialize" => RpcResponse::success(id, self.initialize_result()),
            "ping" => RpcResponse::success(id, json!({})),
            "tools/list" => RpcResponse::success(id, self.tool_list()),
            "tools/call" => self.call_tool(id, &params).await,
            "resources/list" => RpcResponse::success(id, self.resource_list()),
            "resources/read" => self.read_resource(id, &params),
            "prompts/list" => RpcResponse::success(id, self.prompt_list()),
            "prompts/get" => self.get_prompt(id, &params),
            other => {
                warn!(method = other, "Unknown JSON-RPC method");
                RpcResponse::method_not_found(id, other)
            }
        };
        Some(response)
    }

    fn handle_notification(&self, request: &RpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => debug!("Client finished initialisation"),
            "notifications/cancelled" => debug!("Client cancelled a request"),
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    fn initialize_result(&self) -> Value {
        let mut result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version,
            },
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
                "prompts": { "listChanged": false },
            }
        });
        if let (Some(text), Value::Object(map)) = (&self.instructions, &mut result) {
            map.insert("instructions".to_string(), Value::String(text.clone()));
        }
        result
    }

    fn tool_list(&self) -> Value {
        let tools = self
            .dispatcher
            .list_tools()
            .into_iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema.to_json(),
                })
            })
            .collect::<Vec<_>>();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, id: Option<Value>, params: &Map<String, Value>) -> RpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::invalid_params(id, "params.name must be a string");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let result = match self.dispatcher.invoke_tool(name, &arguments).await {
            Ok(output) => json!({
                "content": [{ "type": "text", "text": output.text }],
                "isError": false,
            }),
            Err(err) => {
                warn!(tool = name, kind = err.kind().as_str(), %err, "Tool call failed");
                tool_error_result(&err)
            }
        };
        RpcResponse::success(id, result)
    }

    fn resource_list(&self) -> Value {
        let resources = self
            .dispatcher
            .list_resources()
            .iter()
            .map(|resource| {
                json!({
                    "uri": resource.uri,
                    "name": resource.name,
                    "description": resource.description,
                    "mimeType": resource.mime_type,
                })
            })
            .collect::<Vec<_>>();
        json!({ "resources": resources })
    }

    fn read_resource(&self, id: Option<Value>, params: &Map<String, Value>) -> RpcResponse {
        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return RpcResponse::invalid_params(id, "params.uri must be a string");
        };
        match self.dispatcher.read_resource(uri) {
            Ok(resource) => RpcResponse::success(
                id,
                json!({
                    "contents": [{
                        "uri": resource.uri,
                        "mimeType": resource.mime_type,
                        "text": resource.text,
                    }]
                }),
            ),
            Err(err) => RpcResponse::error(id, RESOURCE_NOT_FOUND, err.to_string())
                .with_data(json!({ "uri": uri })),
        }
    }

    fn prompt_list(&self) -> Value {
        let prompts = self
            .dispatcher
            .list_prompts()
            .iter()
            .map(|prompt| {
                let arguments = prompt
                    .arguments
                    .iter()
                    .map(|argument| {
                        json!({
                            "name": argument.name,
                            "description": argument.description,
                            "required": argument.required,
                        })
                    })
                    .collect::<Vec<_>>();
                json!({
                    "name": prompt.name,
                    "description": prompt.description,
                    "arguments": arguments,
                })
            })
            .collect::<Vec<_>>();
        json!({ "prompts": prompts })
    }

    fn get_prompt(&self, id: Option<Value>, params: &Map<String, Value>) -> RpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::invalid_params(id, "params.name must be a string");
        };
        let empty = Map::new();
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => {
                return RpcResponse::invalid_params(id, "params.arguments must be an object");
            }
        };

        match self.dispatcher.get_prompt(name, arguments) {
            Ok(rendered) => RpcResponse::success(
                id,
                json!({
                    "description": rendered.description,
                    "messages": [{
                        "role": "user",
                        "content": { "type": "text", "text": rendered.text },
                    }]
                }),
            ),
            Err(err) => {
                let response = RpcResponse::invalid_params(id, err.to_string());
                match err.kind() {
                    ErrorKind::InvalidInput => {
                        response.with_data(json!({ "fields": err.invalid_fields() }))
                    }
                    _ => response,
                }
            }
        }
    }
}

fn tool_error_result(err: &DispatchError) -> Value {
    let message = err.to_string();
    json!({
        "content": [{ "type": "text", "text": message }],
        "isError": true,
        "structuredContent": {
            "error": {
                "kind": err.kind().as_str(),
                "message": message,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::{
        DomainError, FnHandler, PromptArgument, PromptArguments, PromptCatalog, PromptTemplate,
        Resource, ResourceCatalog, ToolOutput, ToolRegistry,
    };
    use crate::domain::schema::{ObjectSchema, PropertySchema, ToolDeclaration};
    use crate::domain::validation::ToolArguments;

    fn shout(arguments: ToolArguments) -> Result<ToolOutput, DomainError> {
        match arguments.str("text") {
            Some("") => Err(DomainError::new("nothing to shout")),
            Some(text) => Ok(ToolOutput::text(text.to_uppercase())),
            None => Err(DomainError::new("missing text")),
        }
    }

    fn topic(arguments: &PromptArguments) -> String {
        format!("Tell me about {}", arguments["topic"])
    }

    fn handler() -> McpHandler {
        let schema = ObjectSchema::new([("text", PropertySchema::string("Text"))], ["text"])
            .expect("schema");
        let tools = ToolRegistry::builder()
            .tool(ToolDeclaration::new("shout", "Upper-cases text", schema), FnHandler(shout))
            .build()
            .expect("tools");
        let resources =
            ResourceCatalog::new(vec![Resource::text("notes://a", "A", "Note A", "alpha")])
                .expect("resources");
        let prompts = PromptCatalog::new(vec![PromptTemplate {
            name: "about".into(),
            description: "Asks about a topic".into(),
            arguments: vec![PromptArgument::required("topic", "Topic")],
            render: topic,
        }])
        .expect("prompts");
        McpHandler::new(
            Arc::new(Dispatcher::new(tools, resources, prompts)),
            ServerInfo::new("test-server", "1.0.0"),
        )
        .with_instructions("Use the shout tool.")
    }

    async fn call(handler: &McpHandler, method: &str, params: Value) -> RpcResponse {
        handler
            .handle(RpcRequest::new(1, method, params))
            .await
            .expect("requests get a response")
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_capabilities() {
        let response = call(&handler(), "initialize", json!({})).await;
        let result = response.result.expect("result");
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["instructions"], "Use the shout tool.");
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let handler = handler();
        assert!(handler
            .handle(RpcRequest::notification("notifications/initialized"))
            .await
            .is_none());
        assert!(handler.handle_line(r#"{"jsonrpc":"2.0","method":"tools/list"}"#).await.is_none());
    }

    #[tokio::test]
    async fn tools_list_exposes_input_schema() {
        let response = call(&handler(), "tools/list", json!({})).await;
        let tools = response.result.expect("result")["tools"].clone();
        assert_eq!(tools.as_array().map(Vec::len), Some(1));
        assert_eq!(tools[0]["name"], "shout");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["text"]));
    }

    #[tokio::test]
    async fn tool_success_and_failure_are_both_results() {
        let handler = handler();
        let ok = call(&handler, "tools/call", json!({"name": "shout", "arguments": {"text": "hi"}})).await;
        let ok = ok.result.expect("result");
        assert_eq!(ok["isError"], false);
        assert_eq!(ok["content"][0]["text"], "HI");

        let invalid = call(&handler, "tools/call", json!({"name": "shout", "arguments": {"text": 3}})).await;
        let invalid = invalid.result.expect("errors are results, not rpc errors");
        assert_eq!(invalid["isError"], true);
        assert_eq!(invalid["structuredContent"]["error"]["kind"], "invalid_input");
        assert!(invalid["content"][0]["text"].as_str().unwrap_or_default().contains("text"));

        let unknown = call(&handler, "tools/call", json!({"name": "whisper"})).await;
        let unknown = unknown.result.expect("result");
        assert_eq!(unknown["structuredContent"]["error"]["kind"], "not_found");
        assert_eq!(unknown["content"][0]["text"], "Unknown tool: whisper");
    }

    #[tokio::test]
    async fn unknown_resource_is_an_rpc_error_naming_the_uri() {
        let handler = handler();
        let found = call(&handler, "resources/read", json!({"uri": "notes://a"})).await;
        assert_eq!(found.result.expect("result")["contents"][0]["text"], "alpha");

        let missing = call(&handler, "resources/read", json!({"uri": "notes://zzz"})).await;
        let error = missing.error.expect("error");
        assert_eq!(error.code, RESOURCE_NOT_FOUND);
        assert!(error.message.contains("notes://zzz"));
    }

    #[tokio::test]
    async fn prompts_render_into_a_user_message() {
        let handler = handler();
        let response = call(
            &handler,
            "prompts/get",
            json!({"name": "about", "arguments": {"topic": "stdio"}}),
        )
        .await;
        let result = response.result.expect("result");
        assert_eq!(result["messages"][0]["role"], "user");
        assert_eq!(result["messages"][0]["content"]["text"], "Tell me about stdio");

        let missing = call(&handler, "prompts/get", json!({"name": "about"})).await;
        assert_eq!(missing.error.expect("error").code, super::super::types::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn protocol_errors_use_standard_codes() {
        let handler = handler();
        let unknown = call(&handler, "tools/destroy", json!({})).await;
        assert_eq!(unknown.error.expect("error").code, -32601);

        let parse = handler.handle_line("{not json").await.expect("response");
        assert_eq!(parse.error.expect("error").code, -32700);
        assert!(parse.id.is_none());

        let version = handler
            .handle_line(r#"{"jsonrpc":"1.0","id":5,"method":"ping"}"#)
            .await
            .expect("response");
        assert_eq!(version.error.expect("error").code, -32600);
        assert_eq!(version.id, Some(json!(5)));
    }
}
