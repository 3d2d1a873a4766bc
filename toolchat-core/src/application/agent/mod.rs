//! # Agent Module
//!
//! Drives one user turn of a function-calling conversation.
//!
//! ## Key Types
//!
//! - [`Agent`] - owns the session and runs turns
//! - [`AgentOptions`] - provider, model, system prompt and round bound
//! - [`TurnOutcome`] - final text plus the tool steps taken
//! - [`ModelSession`] - conversation history carried across turns
//! - [`AgentError`] - errors that abort a turn
//!
//! ## Agent Loop
//!
//! 1. Append the user text and send the whole conversation with every declaration
//! 2. If the reply carries no tool calls, its text is the answer
//! 3. Otherwise run the calls in order through the MCP server
//! 4. Send all results back as one tool message and go to 2

mod errors;
mod models;
mod runner;
mod session;
mod tools;


pub use errors::AgentError;
pub use models::{AgentOptions, AgentState, AgentStep, TurnOutcome};
pub use runner::Agent;
pub use session::ModelSession;
pub use tools::{compose_system_prompt, declarations_from_server};
