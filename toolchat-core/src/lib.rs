pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, dispatcher, registry, stdio, tooling};
pub use config::{AppConfig, ModelProviderConfig};
pub use domain::{schema, types, validation};
pub use infrastructure::{model, rpc};
