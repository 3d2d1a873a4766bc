use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("failed to spawn MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("MCP server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("MCP server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("MCP server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("MCP server '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("MCP server '{server}' request cancelled")]
    Cancelled { server: String },
    #[error("MCP server '{server}' did not answer '{method}' within {}s", .after.as_secs())]
    Timeout {
        server: String,
        method: String,
        after: Duration,
    },
}

impl ToolInvokeError {
    /// True when the server answered with a JSON-RPC error object. Every other variant
    /// means the connection itself is unusable.
    pub fn is_rpc(&self) -> bool {
        matches!(self, ToolInvokeError::Rpc { .. })
    }

    /// The bare server message for RPC errors, the full description otherwise.
    pub fn server_message(&self) -> String {
        match self {
            ToolInvokeError::Rpc { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
