//! Function declarations handed to the model.
//!
//! [`translate`] turns a tool's [`ObjectSchema`] into the declaration format of the model
//! APIs. Field names, descriptions, required-ness and enum constraints survive the trip.
//! Enum literals are written as strings in the Gemini form only, since Gemini rejects
//! anything else; the OpenAI form keeps them as declared. Arrays always carry `items`.

use crate::domain::schema::{ObjectSchema, PrimitiveType, PropertySchema, ToolDeclaration};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    /// Lower-case JSON Schema spelling used by OpenAI-style APIs.
    pub fn json_schema_name(self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }
}

impl From<&PrimitiveType> for SchemaType {
    fn from(kind: &PrimitiveType) -> Self {
        match kind {
            PrimitiveType::String | PrimitiveType::Other(_) => SchemaType::String,
            PrimitiveType::Number => SchemaType::Number,
            PrimitiveType::Integer => SchemaType::Integer,
            PrimitiveType::Boolean => SchemaType::Boolean,
            PrimitiveType::Array => SchemaType::Array,
            PrimitiveType::Object => SchemaType::Object,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "enum",
        skip_serializing_if = "Option::is_none",
        serialize_with = "literal_texts"
    )]
    pub allowed: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSchema>>,
}

impl ParameterSchema {
    /// Element schema used when an array property does not declare one.
    fn default_items() -> Self {
        Self {
            kind: SchemaType::String,
            description: None,
            allowed: None,
            items: None,
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("type".into(), json!(self.kind.json_schema_name()));
        if let Some(description) = &self.description {
            entry.insert("description".into(), json!(description));
        }
        if let Some(allowed) = &self.allowed {
            entry.insert("enum".into(), json!(allowed));
        }
        if let Some(items) = &self.items {
            entry.insert("items".into(), items.to_json_schema());
        }
        Value::Object(entry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionParameters {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    pub properties: BTreeMap<String, ParameterSchema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl FunctionParameters {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Serializes as one entry of Gemini's `functionDeclarations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "FunctionParameters::is_empty")]
    pub parameters: FunctionParameters,
}

pub fn translate(declaration: &ToolDeclaration) -> FunctionDeclaration {
    FunctionDeclaration {
        name: declaration.name.clone(),
        description: declaration.description.clone(),
        parameters: translate_schema(&declaration.input_schema),
    }
}

fn translate_schema(schema: &ObjectSchema) -> FunctionParameters {
    let properties = schema
        .properties()
        .iter()
        .map(|(name, property)| (name.clone(), translate_property(property)))
        .collect();
    FunctionParameters {
        kind: SchemaType::Object,
        properties,
        required: schema.required().to_vec(),
    }
}

fn translate_property(property: &PropertySchema) -> ParameterSchema {
    let kind = SchemaType::from(&property.kind);
    let items = (kind == SchemaType::Array).then(|| {
        Box::new(
            property
                .items
                .as_deref()
                .map(translate_property)
                .unwrap_or_else(ParameterSchema::default_items),
        )
    });
    ParameterSchema {
        kind,
        description: property.description.clone(),
        allowed: property.allowed.clone(),
        items,
    }
}

fn literal_texts<S>(values: &Option<Vec<Value>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match values {
        Some(values) => serializer.collect_seq(values.iter().map(literal_text)),
        None => serializer.serialize_none(),
    }
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl FunctionDeclaration {
    /// `tools` entry for OpenAI-compatible and Ollama chat APIs.
    pub fn to_openai_tool(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .properties
            .iter()
            .map(|(name, parameter)| (name.clone(), parameter.to_json_schema()))
            .collect();

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": self.parameters.required,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::PropertySchema;

    fn calculator() -> ToolDeclaration {
        let schema = ObjectSchema::new(
            [
                (
                    "operation",
                    PropertySchema::string("Operation to perform")
                        .with_enum(["add", "subtract", "multiply", "divide"]),
                ),
                ("a", PropertySchema::number("First operand")),
                ("b", PropertySchema::number("Second operand")),
                ("precision", PropertySchema::integer("Digits").with_enum([0, 2])),
            ],
            ["operation", "a", "b"],
        )
        .expect("schema");
        ToolDeclaration::new("calculator", "Basic arithmetic", schema)
    }

    #[test]
    fn gemini_form_uses_upper_case_types_and_string_enums() {
        let value = serde_json::to_value(translate(&calculator())).expect("serialize");
        assert_eq!(value["name"], "calculator");
        assert_eq!(value["parameters"]["type"], "OBJECT");
        assert_eq!(value["parameters"]["properties"]["a"]["type"], "NUMBER");
        assert_eq!(
            value["parameters"]["properties"]["operation"]["enum"],
            json!(["add", "subtract", "multiply", "divide"])
        );
        assert_eq!(value["parameters"]["properties"]["precision"]["enum"], json!(["0", "2"]));
        assert_eq!(value["parameters"]["required"], json!(["operation", "a", "b"]));
    }

    #[test]
    fn unrecognized_kinds_map_to_string() {
        assert_eq!(
            SchemaType::from(&PrimitiveType::Other("date-time".into())),
            SchemaType::String
        );
    }

    #[test]
    fn translation_is_deterministic() {
        let declaration = calculator();
        let first = serde_json::to_string(&translate(&declaration)).expect("serialize");
        let second = serde_json::to_string(&translate(&declaration)).expect("serialize");
        assert_eq!(first, second);
        assert_eq!(translate(&declaration), translate(&declaration));
    }

    #[test]
    fn openai_tool_keeps_json_schema_spelling() {
        let tool = translate(&calculator()).to_openai_tool();
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["function"]["parameters"]["type"], "object");
        assert_eq!(tool["function"]["parameters"]["properties"]["b"]["type"], "number");
        assert_eq!(
            tool["function"]["parameters"]["properties"]["b"]["description"],
            "Second operand"
        );
        assert_eq!(
            tool["function"]["parameters"]["properties"]["precision"],
            json!({"type": "integer", "description": "Digits", "enum": [0, 2]})
        );
    }

    #[test]
    fn arrays_carry_their_element_schema() {
        let schema = ObjectSchema::from_json(&json!({
            "type": "object",
            "properties": {
                "xs": {"type": "array", "items": {"type": "number"}},
                "tags": {"type": "array"}
            }
        }))
        .expect("schema");
        let declaration = translate(&ToolDeclaration::new("sum", "Sums numbers", schema));

        let gemini = serde_json::to_value(&declaration).expect("serialize");
        assert_eq!(gemini["parameters"]["properties"]["xs"]["items"], json!({"type": "NUMBER"}));
        assert_eq!(gemini["parameters"]["properties"]["tags"]["items"], json!({"type": "STRING"}));

        let tool = declaration.to_openai_tool();
        assert_eq!(
            tool["function"]["parameters"]["properties"]["xs"],
            json!({"type": "array", "items": {"type": "number"}})
        );
    }

    #[test]
    fn parameterless_tool_omits_parameters_for_gemini() {
        let declaration = ToolDeclaration::new("now", "Current time", ObjectSchema::empty());
        let value = serde_json::to_value(translate(&declaration)).expect("serialize");
        assert!(value.get("parameters").is_none());
        let tool = translate(&declaration).to_openai_tool();
        assert_eq!(tool["function"]["parameters"]["properties"], json!({}));
    }
}
