use crate::constants::DEFAULT_MAX_TOOL_ROUNDS;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// One executed tool call.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub tool: String,
    pub call_id: String,
    pub input: Value,
    pub success: bool,
    pub output: Value,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: String,
    pub response: String,
    pub steps: Vec<AgentStep>,
    /// Tool-result batches sent to the model during the turn.
    pub rounds: usize,
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    /// `0` lifts the bound.
    pub max_rounds: usize,
}

impl AgentOptions {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            system_prompt: None,
            max_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt.filter(|text| !text.trim().is_empty());
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    AwaitingUserInput,
    ModelRequested,
    ToolsRequested,
    ToolsExecuting,
    FinalAnswer,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgentState::AwaitingUserInput => "awaiting user input",
            AgentState::ModelRequested => "model requested",
            AgentState::ToolsRequested => "tools requested",
            AgentState::ToolsExecuting => "tools executing",
            AgentState::FinalAnswer => "final answer",
        })
    }
}
