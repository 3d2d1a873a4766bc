//! Immutable catalogues served by the dispatcher.
//!
//! All three are populated once at startup through their builders and never mutated
//! afterwards; the dispatcher owns them and hands out shared references.

mod error;
mod prompts;
mod resources;
mod tools;

pub use error::RegistryError;
pub use prompts::{PromptArgument, PromptArguments, PromptCatalog, PromptTemplate, RenderedPrompt};
pub use resources::{Resource, ResourceCatalog};
pub use tools::{DomainError, FnHandler, ToolDefinition, ToolHandler, ToolOutput, ToolRegistry, ToolRegistryBuilder};
