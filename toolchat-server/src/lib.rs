//! Toy MCP server: calculator and mock weather tools, notes resources and prompt templates.
//!
//! [`build_handler`] assembles the catalogues into an [`McpHandler`]; the binary serves it
//! on stdin/stdout.

pub mod notes;
pub mod prompts;
pub mod tools;

use std::sync::Arc;
use thiserror::Error;
use toolchat_core::dispatcher::Dispatcher;
use toolchat_core::registry::RegistryError;
use toolchat_core::rpc::{McpHandler, ServerInfo};
use toolchat_core::schema::SchemaError;

pub const SERVER_NAME: &str = "toolchat-server";

const INSTRUCTIONS: &str = "Use the calculator tool for any arithmetic instead of computing \
    in your head, and get_weather for weather questions. Background notes are available as \
    notes:// resources.";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid tool schema: {0}")]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub fn build_dispatcher() -> Result<Dispatcher, SetupError> {
    Ok(Dispatcher::new(
        tools::registry()?,
        notes::catalog()?,
        prompts::catalog()?,
    ))
}

pub fn build_handler() -> Result<McpHandler, SetupError> {
    let dispatcher = build_dispatcher()?;
    Ok(McpHandler::new(
        Arc::new(dispatcher),
        ServerInfo::new(SERVER_NAME, env!("CARGO_PKG_VERSION")),
    )
    .with_instructions(INSTRUCTIONS))
}
