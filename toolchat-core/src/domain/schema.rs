//! Tool input schemas
//!
//! A restricted JSON-Schema shape: an object with typed properties, optional enum
//! constraints and a list of required fields. Properties live in a sorted map so the
//! serialized form is deterministic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("required field '{field}' is not declared in properties")]
    UndeclaredRequired { field: String },
    #[error("input schema must have type 'object', found '{found}'")]
    NotAnObject { found: String },
}

/// Primitive kind of a single property.
///
/// Unrecognized tags are kept in `Other` so foreign schemas still load; every consumer
/// treats them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrimitiveType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Other(String),
}

impl PrimitiveType {
    pub fn as_str(&self) -> &str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Array => "array",
            PrimitiveType::Object => "object",
            PrimitiveType::Other(raw) => raw,
        }
    }
}

impl From<String> for PrimitiveType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "string" => PrimitiveType::String,
            "number" => PrimitiveType::Number,
            "integer" => PrimitiveType::Integer,
            "boolean" => PrimitiveType::Boolean,
            "array" => PrimitiveType::Array,
            "object" => PrimitiveType::Object,
            _ => PrimitiveType::Other(value),
        }
    }
}

impl From<PrimitiveType> for String {
    fn from(value: PrimitiveType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type", default)]
    pub kind: PrimitiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    /// Element schema of an `array` property.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
}

impl PropertySchema {
    pub fn new(kind: PrimitiveType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: Some(description.into()),
            allowed: None,
            items: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::new(PrimitiveType::String, description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::new(PrimitiveType::Number, description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(PrimitiveType::Integer, description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(PrimitiveType::Boolean, description)
    }

    pub fn array(description: impl Into<String>, items: PropertySchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(PrimitiveType::Array, description)
        }
    }

    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawObjectSchema {
    #[serde(rename = "type", default = "object_tag")]
    kind: String,
    #[serde(default)]
    properties: BTreeMap<String, PropertySchema>,
    #[serde(default)]
    required: Vec<String>,
}

fn object_tag() -> String {
    "object".to_string()
}

/// Input schema of a tool. Every required field is guaranteed to be a declared property.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawObjectSchema", into = "RawObjectSchema")]
pub struct ObjectSchema {
    properties: BTreeMap<String, PropertySchema>,
    required: Vec<String>,
}

impl ObjectSchema {
    pub fn new<P, R, S>(properties: P, required: R) -> Result<Self, SchemaError>
    where
        P: IntoIterator<Item = (S, PropertySchema)>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let properties: BTreeMap<String, PropertySchema> = properties
            .into_iter()
            .map(|(name, schema)| (name.into(), schema))
            .collect();
        let mut fields: Vec<String> = Vec::new();
        for field in required.into_iter().map(Into::into) {
            if !properties.contains_key(&field) {
                return Err(SchemaError::UndeclaredRequired { field });
            }
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        Ok(Self {
            properties,
            required: fields,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertySchema> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|field| field == name)
    }

    pub fn from_json(value: &Value) -> Result<Self, SchemaFromJsonError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(RawObjectSchema::from(self.clone())).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Error)]
#[error("invalid input schema: {0}")]
pub struct SchemaFromJsonError(#[from] serde_json::Error);

impl TryFrom<RawObjectSchema> for ObjectSchema {
    type Error = SchemaError;

    fn try_from(raw: RawObjectSchema) -> Result<Self, Self::Error> {
        if raw.kind != "object" {
            return Err(SchemaError::NotAnObject { found: raw.kind });
        }
        ObjectSchema::new(raw.properties, raw.required)
    }
}

impl From<ObjectSchema> for RawObjectSchema {
    fn from(schema: ObjectSchema) -> Self {
        Self {
            kind: object_tag(),
            properties: schema.properties,
            required: schema.required,
        }
    }
}

/// Name, description and input schema of a registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub input_schema: ObjectSchema,
}

impl ToolDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: ObjectSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}
