//! Client side of the MCP connection: the seam the agent talks through, the stdio child
//! process implementation and an in-process bridge over the same JSON-RPC handler.

mod error;
mod interface;
mod local;
mod process;

pub use error::ToolInvokeError;
pub use interface::{
    PromptArgumentInfo, PromptInfo, PromptMessages, ResourceContent, ResourceInfo,
    ServerToolInfo, ToolCallOutcome, ToolServerInterface, extract_tool_message,
};
pub use local::LocalBridge;
pub use process::McpProcess;
