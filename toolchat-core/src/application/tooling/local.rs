use super::error::ToolInvokeError;
use super::interface::ToolServerInterface;
use crate::infrastructure::rpc::{McpHandler, RpcRequest};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Talks to an [`McpHandler`] in the same process, through the same request and response
/// shapes a stdio connection carries.
#[derive(Debug, Clone)]
pub struct LocalBridge {
    name: String,
    handler: Arc<McpHandler>,
    id_counter: Arc<AtomicU64>,
}

impl LocalBridge {
    pub fn new(name: impl Into<String>, handler: Arc<McpHandler>) -> Self {
        Self {
            name: name.into(),
            handler,
            id_counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

#[async_trait]
impl ToolServerInterface for LocalBridge {
    fn server_name(&self) -> &str {
        &self.name
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = format!("req-{}", self.id_counter.fetch_add(1, Ordering::SeqCst));
        let response = self
            .handler
            .handle(RpcRequest::new(id, method, params))
            .await
            .ok_or_else(|| ToolInvokeError::Transport {
                server: self.name.clone(),
                message: format!("no response to '{method}'"),
            })?;

        match response.error {
            Some(error) => Err(ToolInvokeError::Rpc {
                server: self.name.clone(),
                code: error.code,
                message: error.message,
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        }
    }

    async fn server_instructions(&self) -> Option<String> {
        self.request("initialize", json!({}))
            .await
            .ok()?
            .get("instructions")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}
