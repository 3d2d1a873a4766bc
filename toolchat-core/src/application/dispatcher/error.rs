use crate::domain::validation::Violation;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// What kind of entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Tool,
    Resource,
    Prompt,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Tool => "tool",
            EntityKind::Resource => "resource",
            EntityKind::Prompt => "prompt",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    DomainError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::DomainError => "domain_error",
        }
    }
}

/// Failures the dispatcher reports back to its caller as data.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("Unknown {kind}: {name}")]
    NotFound { kind: EntityKind, name: String },
    #[error("Invalid arguments for {target}: {}", describe(.violations))]
    InvalidInput {
        target: String,
        violations: Vec<Violation>,
    },
    #[error("{message}")]
    Domain { message: String },
}

impl DispatchError {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NotFound { .. } => ErrorKind::NotFound,
            DispatchError::InvalidInput { .. } => ErrorKind::InvalidInput,
            DispatchError::Domain { .. } => ErrorKind::DomainError,
        }
    }

    /// Names of the fields that failed validation, empty for other variants.
    pub fn invalid_fields(&self) -> Vec<&str> {
        match self {
            DispatchError::InvalidInput { violations, .. } => {
                violations.iter().map(|v| v.field.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
