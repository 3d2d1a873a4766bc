use super::error::RegistryError;
use std::collections::HashMap;

/// A static, addressable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub text: String,
}

impl Resource {
    pub fn text(
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: description.into(),
            mime_type: "text/plain".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl ResourceCatalog {
    pub fn new(resources: Vec<Resource>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(resources.len());
        for (position, resource) in resources.iter().enumerate() {
            if index.insert(resource.uri.clone(), position).is_some() {
                return Err(RegistryError::DuplicateResource(resource.uri.clone()));
            }
        }
        Ok(Self { resources, index })
    }

    pub fn get(&self, uri: &str) -> Option<&Resource> {
        self.index.get(uri).map(|position| &self.resources[*position])
    }

    pub fn all(&self) -> &[Resource] {
        &self.resources
    }
}
