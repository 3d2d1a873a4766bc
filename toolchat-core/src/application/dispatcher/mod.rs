//! Server-side dispatch of tool calls, resource reads and prompt requests.

mod error;


pub use error::{DispatchError, EntityKind, ErrorKind};

use crate::application::registry::{
    PromptArguments, PromptCatalog, PromptTemplate, RenderedPrompt, Resource, ResourceCatalog,
    ToolOutput, ToolRegistry,
};
use crate::domain::schema::{PrimitiveType, ToolDeclaration};
use crate::domain::validation::{Violation, ViolationKind, type_name, validate};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use tracing::{info, warn};

/// Answers list queries and executes actions against the immutable catalogues.
///
/// Every handler failure, including a panic, comes back as a [`DispatchError`]; nothing a
/// tool does can take the serving process down.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    tools: ToolRegistry,
    resources: ResourceCatalog,
    prompts: PromptCatalog,
}

impl Dispatcher {
    pub fn new(tools: ToolRegistry, resources: ResourceCatalog, prompts: PromptCatalog) -> Self {
        Self {
            tools,
            resources,
            prompts,
        }
    }

    pub fn list_tools(&self) -> Vec<&ToolDeclaration> {
        self.tools.declarations().collect()
    }

    pub fn list_resources(&self) -> &[Resource] {
        self.resources.all()
    }

    pub fn list_prompts(&self) -> &[PromptTemplate] {
        self.prompts.all()
    }

    pub async fn invoke_tool(&self, name: &str, arguments: &Value) -> Result<ToolOutput, DispatchError> {
        info!(tool = name, "Tool call");
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "Unknown tool requested");
            return Err(DispatchError::not_found(EntityKind::Tool, name));
        };

        let validated = validate(&tool.declaration.input_schema, arguments).map_err(|violations| {
            DispatchError::InvalidInput {
                target: name.to_string(),
                violations,
            }
        })?;

        match AssertUnwindSafe(tool.handler.call(validated)).catch_unwind().await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(domain)) => Err(DispatchError::Domain {
                message: domain.message,
            }),
            Err(_) => {
                warn!(tool = name, "Tool handler panicked");
                Err(DispatchError::Domain {
                    message: format!("tool '{name}' failed unexpectedly"),
                })
            }
        }
    }

    pub fn read_resource(&self, uri: &str) -> Result<&Resource, DispatchError> {
        info!(uri, "Resource read");
        self.resources
            .get(uri)
            .ok_or_else(|| DispatchError::not_found(EntityKind::Resource, uri))
    }

    /// Renders a prompt; every argument must be a string and required ones present.
    pub fn get_prompt(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<RenderedPrompt, DispatchError> {
        info!(prompt = name, "Prompt request");
        let template = self
            .prompts
            .get(name)
            .ok_or_else(|| DispatchError::not_found(EntityKind::Prompt, name))?;

        let mut values = PromptArguments::new();
        let mut violations = Vec::new();
        for argument in &template.arguments {
            match arguments.get(&argument.name) {
                Some(Value::String(text)) => {
                    values.insert(argument.name.clone(), text.clone());
                }
                Some(other) if !other.is_null() => violations.push(Violation {
                    field: argument.name.clone(),
                    kind: ViolationKind::WrongType {
                        expected: PrimitiveType::String,
                        found: type_name(other),
                    },
                }),
                _ if argument.required => violations.push(Violation {
                    field: argument.name.clone(),
                    kind: ViolationKind::Missing,
                }),
                _ => {}
            }
        }
        if !violations.is_empty() {
            return Err(DispatchError::InvalidInput {
                target: name.to_string(),
                violations,
            });
        }

        Ok(RenderedPrompt {
            description: template.description.clone(),
            text: (template.render)(&values),
        })
    }
}
