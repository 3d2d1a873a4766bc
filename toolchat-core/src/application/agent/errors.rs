use crate::application::tooling::ToolInvokeError;
use crate::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("failed to discover tools: {0}")]
    Discovery(#[source] ToolInvokeError),
    #[error("failed to execute tool '{tool}': {source}")]
    Tool {
        tool: String,
        #[source]
        source: ToolInvokeError,
    },
    #[error("tool results do not match the requested calls: {reason}")]
    UnpairedResults { reason: String },
    #[error("agent exceeded the maximum of {limit} tool rounds")]
    RoundLimitExceeded { limit: usize },
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::Discovery(err) => {
                format!("Could not read the tool list from the MCP server: {err}")
            }
            AgentError::Tool { tool, source } => {
                format!("Running tool \"{tool}\" failed: {source}")
            }
            AgentError::UnpairedResults { .. } => {
                "Tool results got out of step with the model's requests; the turn was discarded."
                    .to_string()
            }
            AgentError::RoundLimitExceeded { limit } => format!(
                "The model kept calling tools after {limit} rounds; the turn was stopped. Try rephrasing."
            ),
        }
    }
}
