//! Static notes served as `notes://` resources.

use toolchat_core::registry::{RegistryError, Resource, ResourceCatalog};

pub const WELCOME: &str = "notes://welcome";
pub const MCP_OVERVIEW: &str = "notes://mcp-overview";
pub const TOOL_CALLING: &str = "notes://tool-calling";

pub fn catalog() -> Result<ResourceCatalog, RegistryError> {
    ResourceCatalog::new(vec![
        Resource::text(
            WELCOME,
            "Welcome",
            "What this server offers",
            "Welcome to the toolchat server. It offers a calculator, a mock weather service, \
             a few notes like this one and prompt templates that combine them.",
        ),
        Resource::text(
            MCP_OVERVIEW,
            "MCP overview",
            "A short introduction to the Model Context Protocol",
            "The Model Context Protocol lets a client discover what a server offers. \
             Tools are functions the model may call with JSON arguments. Resources are \
             documents addressed by URI that the client can read. Prompts are named \
             templates the server renders from arguments. Messages are JSON-RPC 2.0, one \
             per line on the server's standard input and output.",
        ),
        Resource::text(
            TOOL_CALLING,
            "Tool calling",
            "How a model uses tools during a conversation",
            "When a model needs a tool it answers with one or more function calls instead \
             of text. The client runs each call against the server in order, then sends \
             every result back in a single message. The model either calls more tools or \
             writes its final answer.",
        ),
    ])
}
