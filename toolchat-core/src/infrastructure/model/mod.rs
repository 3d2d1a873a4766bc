//! Model infrastructure module
//!
//! Chat backends with native function calling.
//!
//! # Structure
//! - `types` - Request, Response, Error types
//! - `traits` - ModelProvider, ModelClient traits
//! - `declaration` - tool schema → function declaration translation
//! - `adapter` - Message format adapters
//! - `factory` - Provider factory for creating clients
//! - `clients` - Individual client implementations
//! - `provider` - DynamicModelProvider for routing

pub mod adapter;
pub mod clients;
pub mod declaration;
pub mod factory;
pub mod provider;
pub mod traits;
pub mod types;

pub use declaration::{FunctionDeclaration, translate};
pub use provider::DynamicModelProvider;
pub use traits::{ModelClient, ModelProvider};
pub use types::{ModelError, ModelRequest, ModelResponse};
