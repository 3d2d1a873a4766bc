use super::error::RegistryError;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// String arguments supplied to a prompt template, keyed by argument name.
pub type PromptArguments = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl PromptArgument {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Named template rendered into a single user message.
#[derive(Clone)]
pub struct PromptTemplate {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    pub render: fn(&PromptArguments) -> String,
}

impl fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub description: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    prompts: Vec<PromptTemplate>,
    index: HashMap<String, usize>,
}

impl PromptCatalog {
    pub fn new(prompts: Vec<PromptTemplate>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(prompts.len());
        for (position, prompt) in prompts.iter().enumerate() {
            if index.insert(prompt.name.clone(), position).is_some() {
                return Err(RegistryError::DuplicatePrompt(prompt.name.clone()));
            }
        }
        Ok(Self { prompts, index })
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.index.get(name).map(|position| &self.prompts[*position])
    }

    pub fn all(&self) -> &[PromptTemplate] {
        &self.prompts
    }
}
