use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is registered more than once")]
    DuplicateTool(String),
    #[error("resource '{0}' is registered more than once")]
    DuplicateResource(String),
    #[error("prompt '{0}' is registered more than once")]
    DuplicatePrompt(String),
}
