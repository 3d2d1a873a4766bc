use super::errors::AgentError;
use super::models::{AgentOptions, AgentState, AgentStep, TurnOutcome};
use super::session::ModelSession;
use super::tools::{compose_system_prompt, declarations_from_server};
use crate::application::tooling::ToolServerInterface;
use crate::model::{FunctionDeclaration, ModelProvider};
use crate::types::{ChatMessage, MessageRole, ToolCall, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs user turns against a model, executing the tools it asks for through an MCP server.
///
/// The session lives as long as the agent; each call to [`Agent::run_turn`] adds to it.
pub struct Agent<P: ModelProvider> {
    provider: Arc<P>,
    bridge: Arc<dyn ToolServerInterface>,
    tools: Vec<FunctionDeclaration>,
    session: ModelSession,
    max_rounds: usize,
    state: AgentState,
    last_steps: Vec<AgentStep>,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(
        provider: Arc<P>,
        bridge: Arc<dyn ToolServerInterface>,
        tools: Vec<FunctionDeclaration>,
        options: AgentOptions,
    ) -> Self {
        Self {
            provider,
            bridge,
            tools,
            session: ModelSession::new(options.provider, options.model, options.system_prompt),
            max_rounds: options.max_rounds,
            state: AgentState::AwaitingUserInput,
            last_steps: Vec::new(),
        }
    }

    /// Lists the server's tools and instructions, then builds the agent around them.
    pub async fn connect(
        provider: Arc<P>,
        bridge: Arc<dyn ToolServerInterface>,
        mut options: AgentOptions,
    ) -> Result<Self, AgentError> {
        let advertised = bridge.list_tools().await.map_err(AgentError::Discovery)?;
        let tools = declarations_from_server(&advertised);
        let instructions = bridge.server_instructions().await;
        options.system_prompt = compose_system_prompt(
            options.system_prompt.as_deref(),
            bridge.server_name(),
            instructions.as_deref(),
        );
        info!(
            server = bridge.server_name(),
            tools = tools.len(),
            "Agent connected to MCP server"
        );
        Ok(Self::new(provider, bridge, tools, options))
    }

    pub fn session(&self) -> &ModelSession {
        &self.session
    }

    pub fn tools(&self) -> &[FunctionDeclaration] {
        &self.tools
    }

    pub fn bridge(&self) -> &Arc<dyn ToolServerInterface> {
        &self.bridge
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Steps of the most recent turn, successful or not.
    pub fn last_steps(&self) -> &[AgentStep] {
        &self.last_steps
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.last_steps.clear();
        self.state = AgentState::AwaitingUserInput;
        info!(session_id = self.session.id(), "Started a new session");
    }

    /// Runs one user turn to its final answer.
    ///
    /// On error the session is restored to what it was before the turn.
    pub async fn run_turn(&mut self, prompt: impl Into<String>) -> Result<TurnOutcome, AgentError> {
        let checkpoint = self.session.len();
        self.last_steps.clear();
        let result = self.drive_turn(prompt.into()).await;
        if let Err(err) = &result {
            warn!(session_id = self.session.id(), %err, "Turn aborted");
            self.session.rollback(checkpoint);
        }
        self.state = AgentState::AwaitingUserInput;
        result
    }

    async fn drive_turn(&mut self, prompt: String) -> Result<TurnOutcome, AgentError> {
        self.session.push(ChatMessage::new(MessageRole::User, prompt));
        let mut rounds = 0usize;

        loop {
            self.state = AgentState::ModelRequested;
            debug!(
                session_id = self.session.id(),
                rounds,
                messages = self.session.len(),
                "Submitting conversation to model provider"
            );
            let response = self
                .provider
                .chat(self.session.request(self.tools.clone()))
                .await?;
            let message = response.message;

            if !message.has_tool_calls() {
                self.state = AgentState::FinalAnswer;
                info!(session_id = self.session.id(), rounds, "Model returned final response");
                let text = message.content.clone();
                self.session.push(message);
                return Ok(TurnOutcome {
                    session_id: self.session.id().to_string(),
                    response: text,
                    steps: self.last_steps.clone(),
                    rounds,
                });
            }

            if self.max_rounds != 0 && rounds >= self.max_rounds {
                warn!(limit = self.max_rounds, "Agent exceeded max tool rounds");
                return Err(AgentError::RoundLimitExceeded {
                    limit: self.max_rounds,
                });
            }

            self.state = AgentState::ToolsRequested;
            let calls = message.tool_calls.clone();
            info!(
                session_id = self.session.id(),
                calls = calls.len(),
                "Model requested tool execution"
            );
            self.session.push(message);

            self.state = AgentState::ToolsExecuting;
            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                results.push(self.execute(call).await?);
            }
            ensure_paired(&calls, &results)?;

            self.session.push(ChatMessage::tool_results(results));
            rounds += 1;
        }
    }

    async fn execute(&mut self, call: &ToolCall) -> Result<ToolResult, AgentError> {
        let input = call.arguments_value();
        let (success, output, text) = match self.bridge.invoke_tool(&call.name, input.clone()).await
        {
            Ok(outcome) => {
                let text = outcome.text();
                (!outcome.is_error, outcome.output, text)
            }
            Err(err) if err.is_rpc() => (false, Value::Null, err.server_message()),
            Err(source) => {
                warn!(tool = call.name.as_str(), %source, "Tool transport failed");
                return Err(AgentError::Tool {
                    tool: call.name.clone(),
                    source,
                });
            }
        };
        info!(tool = call.name.as_str(), success, "Tool executed");

        self.last_steps.push(AgentStep {
            tool: call.name.clone(),
            call_id: call.id.clone(),
            input,
            success,
            output,
            message: Some(text.clone()),
        });
        Ok(ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content: text,
            is_error: !success,
        })
    }
}

/// Every call must be answered exactly once, in order.
pub(crate) fn ensure_paired(calls: &[ToolCall], results: &[ToolResult]) -> Result<(), AgentError> {
    if calls.len() != results.len() {
        return Err(AgentError::UnpairedResults {
            reason: format!("{} calls but {} results", calls.len(), results.len()),
        });
    }
    for (position, (call, result)) in calls.iter().zip(results).enumerate() {
        if call.id != result.call_id || call.name != result.name {
            return Err(AgentError::UnpairedResults {
                reason: format!(
                    "result {position} answers '{}' ({}) instead of '{}' ({})",
                    result.name, result.call_id, call.name, call.id
                ),
            });
        }
    }
    Ok(())
}
