//! Runs the agent against the real server catalogues through an in-process bridge.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;
use toolchat_core::agent::{Agent, AgentOptions};
use toolchat_core::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
use toolchat_core::tooling::LocalBridge;
use toolchat_core::types::{MessageRole, ToolCall};

struct ScriptedProvider {
    responses: Mutex<Vec<ModelResponse>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ModelResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().await.push(request);
        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Err(ModelError::invalid_response("scripted", "script exhausted"));
        }
        Ok(responses.remove(0))
    }
}

fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    let arguments: Map<String, Value> = arguments.as_object().cloned().unwrap_or_default();
    ToolCall::new(id, name, arguments)
}

async fn agent(provider: Arc<ScriptedProvider>) -> Agent<ScriptedProvider> {
    let handler = toolchat_server::build_handler().expect("handler");
    let bridge = Arc::new(LocalBridge::new(
        toolchat_server::SERVER_NAME,
        Arc::new(handler),
    ));
    Agent::connect(provider, bridge, AgentOptions::new("scripted", "model"))
        .await
        .expect("connect")
}

#[tokio::test]
async fn declarations_reach_the_model_with_server_guidance() {
    let provider = ScriptedProvider::new(vec![ModelResponse::new("ok".into(), None)]);
    let mut agent = agent(provider.clone()).await;
    agent.run_turn("hello").await.expect("turn");

    let requests = provider.requests.lock().await;
    let names: Vec<&str> = requests[0].tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, ["calculator", "get_weather"]);
    let calculator = serde_json::to_value(&requests[0].tools[0]).expect("json");
    assert_eq!(calculator["parameters"]["properties"]["operation"]["type"], "STRING");
    assert_eq!(
        calculator["parameters"]["properties"]["operation"]["enum"],
        json!(["add", "subtract", "multiply", "divide"])
    );
    assert_eq!(requests[0].messages[0].role, MessageRole::System);
    assert!(requests[0].messages[0].content.contains("toolchat-server"));
}

#[tokio::test]
async fn calculator_and_weather_in_one_batch() {
    let provider = ScriptedProvider::new(vec![
        ModelResponse::with_tool_calls(
            String::new(),
            vec![
                call("c1", "calculator", json!({"operation": "multiply", "a": 25, "b": 4})),
                call("c2", "get_weather", json!({"city": "TOKYO", "unit": "celsius"})),
            ],
            None,
        ),
        ModelResponse::new("25 times 4 is 100 and Tokyo is mild.".into(), None),
    ]);
    let mut agent = agent(provider.clone()).await;

    let outcome = agent.run_turn("25*4 and weather in Tokyo?").await.expect("turn");
    assert_eq!(outcome.rounds, 1);
    assert_eq!(outcome.steps.len(), 2);

    let requests = provider.requests.lock().await;
    let batch = requests[1].messages.last().expect("batch");
    assert_eq!(batch.role, MessageRole::Tool);
    assert_eq!(batch.tool_results[0].content, "100");
    assert_eq!(batch.tool_results[0].call_id, "c1");
    assert!(batch.tool_results[1].content.starts_with("Weather in Tokyo: 22°C"));
    assert!(batch.tool_results.iter().all(|result| !result.is_error));

    // user, assistant with calls, tool batch, final answer
    assert_eq!(agent.session().len(), 4);
}

#[tokio::test]
async fn tool_failures_become_data_for_the_model() {
    let provider = ScriptedProvider::new(vec![
        ModelResponse::with_tool_calls(
            String::new(),
            vec![
                call("c1", "calculator", json!({"operation": "divide", "a": 1, "b": 0})),
                call("c2", "calculator", json!({"operation": "add", "a": "x", "b": 2})),
                call("c3", "Calculator", json!({})),
            ],
            None,
        ),
        ModelResponse::new("I could not compute that.".into(), None),
    ]);
    let mut agent = agent(provider.clone()).await;

    let outcome = agent.run_turn("break things").await.expect("turn survives");
    assert_eq!(outcome.response, "I could not compute that.");

    let requests = provider.requests.lock().await;
    let results = &requests[1].messages.last().expect("batch").tool_results;
    assert!(results.iter().all(|result| result.is_error));
    assert_eq!(results[0].content, "Division by zero is not allowed");
    assert!(results[1].content.contains("field 'a'"));
    assert!(results[2].content.contains("Calculator"));
}
