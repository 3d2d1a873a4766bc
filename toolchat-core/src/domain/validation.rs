//! Argument validation against an [`ObjectSchema`].
//!
//! Arguments arrive as untyped JSON. `validate` either returns a [`ToolArguments`] record
//! that handlers can read with typed accessors, or the full list of violated constraints.

use super::schema::{ObjectSchema, PrimitiveType};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    Missing,
    WrongType { expected: PrimitiveType, found: &'static str },
    NotAllowed { allowed: Vec<Value> },
}

/// One violated constraint, always naming the offending field.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "field '{}' is required", self.field),
            ViolationKind::WrongType { expected, found } => write!(
                f,
                "field '{}' must be of type {expected}, got {found}",
                self.field
            ),
            ViolationKind::NotAllowed { allowed } => {
                let options = allowed
                    .iter()
                    .map(|value| match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "field '{}' must be one of: {options}", self.field)
            }
        }
    }
}

/// Arguments that passed validation. Typed accessors return `None` only for optional
/// fields the caller left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(|value| {
            value
                .as_i64()
                .or_else(|| value.as_f64().filter(|n| n.fract() == 0.0).map(|n| n as i64))
        })
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

/// Checks required presence, primitive type and enum membership for every field.
///
/// Fields not declared in the schema are passed through untouched.
pub fn validate(schema: &ObjectSchema, arguments: &Value) -> Result<ToolArguments, Vec<Violation>> {
    let empty = Map::new();
    let values = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(vec![Violation {
                field: "arguments".to_string(),
                kind: ViolationKind::WrongType {
                    expected: PrimitiveType::Object,
                    found: type_name(other),
                },
            }]);
        }
    };

    let mut violations = Vec::new();
    for field in schema.required() {
        if !values.contains_key(field) {
            violations.push(Violation {
                field: field.clone(),
                kind: ViolationKind::Missing,
            });
        }
    }

    for (field, property) in schema.properties() {
        let Some(value) = values.get(field) else {
            continue;
        };
        if !matches_type(&property.kind, value) {
            violations.push(Violation {
                field: field.clone(),
                kind: ViolationKind::WrongType {
                    expected: property.kind.clone(),
                    found: type_name(value),
                },
            });
            continue;
        }
        if let Some(allowed) = &property.allowed {
            if !allowed
                .iter()
                .any(|candidate| enum_matches(&property.kind, candidate, value))
            {
                violations.push(Violation {
                    field: field.clone(),
                    kind: ViolationKind::NotAllowed {
                        allowed: allowed.clone(),
                    },
                });
            }
        }
    }

    if violations.is_empty() {
        Ok(ToolArguments {
            values: values.clone(),
        })
    } else {
        Err(violations)
    }
}

fn matches_type(kind: &PrimitiveType, value: &Value) -> bool {
    match kind {
        PrimitiveType::String | PrimitiveType::Other(_) => value.is_string(),
        PrimitiveType::Number => value.is_number(),
        PrimitiveType::Integer => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().map(|n| n.fract() == 0.0).unwrap_or(false)
        }
        PrimitiveType::Boolean => value.is_boolean(),
        PrimitiveType::Array => value.is_array(),
        PrimitiveType::Object => value.is_object(),
    }
}

/// Numeric enums compare by value, so `2.0` matches a declared `2`.
fn enum_matches(kind: &PrimitiveType, candidate: &Value, value: &Value) -> bool {
    match (kind, candidate.as_f64(), value.as_f64()) {
        (PrimitiveType::Number | PrimitiveType::Integer, Some(expected), Some(found)) => {
            expected == found
        }
        _ => candidate == value,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
