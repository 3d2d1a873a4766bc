use super::error::RegistryError;
use crate::domain::schema::ToolDeclaration;
use crate::domain::validation::ToolArguments;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Business-rule failure raised by a tool handler (e.g. division by zero).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DomainError {
    pub message: String,
}

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Textual payload returned by a successful tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, DomainError>;
}

/// Adapts a plain function into a [`ToolHandler`].
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(ToolArguments) -> Result<ToolOutput, DomainError> + Send + Sync,
{
    async fn call(&self, arguments: ToolArguments) -> Result<ToolOutput, DomainError> {
        (self.0)(arguments)
    }
}

#[derive(Clone)]
pub struct ToolDefinition {
    pub declaration: ToolDeclaration,
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("declaration", &self.declaration)
            .finish_non_exhaustive()
    }
}

/// Name → tool mapping. Lookup is exact and case-sensitive; listing keeps
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|position| &self.tools[*position])
    }

    pub fn declarations(&self) -> impl Iterator<Item = &ToolDeclaration> {
        self.tools.iter().map(|tool| &tool.declaration)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistryBuilder {
    pub fn tool<H>(mut self, declaration: ToolDeclaration, handler: H) -> Self
    where
        H: ToolHandler + 'static,
    {
        self.tools.push(ToolDefinition {
            declaration,
            handler: Arc::new(handler),
        });
        self
    }

    pub fn build(self) -> Result<ToolRegistry, RegistryError> {
        let mut index = HashMap::with_capacity(self.tools.len());
        for (position, tool) in self.tools.iter().enumerate() {
            let name = tool.declaration.name.clone();
            if index.insert(name.clone(), position).is_some() {
                return Err(RegistryError::DuplicateTool(name));
            }
        }
        Ok(ToolRegistry {
            tools: self.tools,
            index,
        })
    }
}
