//! # Provider Configuration
//!
//! Configuration types for the model providers the chat loop can talk to.
//!
//! | Type | Description | API Key Required |
//! |------|-------------|-----------------|
//! | `gemini` | Google Gemini API | Yes |
//! | `openai` | OpenAI-compatible APIs | Yes |
//! | `ollama` | Local Ollama server | No |

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;

/// Information about an available model from a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier used in API calls (e.g., "gemini-2.0-flash")
    pub name: String,
    /// Human-readable display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Configuration for an AI model provider.
///
/// # Example
///
/// ```toml
/// [[providers]]
/// id = "gemini"
/// type = "gemini"
/// endpoint = "https://generativelanguage.googleapis.com"
/// api_key = "GEMINI_API_KEY"
/// models = [
///     { name = "gemini-2.0-flash", display_name = "Gemini 2.0 Flash" }
/// ]
/// ```
///
/// `api_key` names the environment variable holding the key, never the key itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelProviderConfig {
    /// Unique identifier for this provider (e.g., "gemini", "ollama-local")
    pub id: String,
    /// The provider type determines API format: "ollama", "gemini", "openai"
    #[serde(rename = "type")]
    pub provider_type: String,
    /// API endpoint URL
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API path override (e.g., "v1beta/models" for Gemini)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: String,
    #[serde(rename = "type", default)]
    pub(super) provider_type: String,
    pub(super) endpoint: Option<String>,
    pub(super) api_key: Option<String>,
    #[serde(default)]
    pub(super) api_path: Option<String>,
    #[serde(default)]
    pub(super) models: Vec<RawModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum RawModelInfo {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        display_name: Option<String>,
    },
}

impl From<RawModelInfo> for ModelInfo {
    fn from(value: RawModelInfo) -> Self {
        match value {
            RawModelInfo::Name(name) => Self {
                name,
                display_name: None,
            },
            RawModelInfo::Detailed { name, display_name } => Self { name, display_name },
        }
    }
}

impl From<RawProviderConfig> for ModelProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        Self {
            id: raw.id,
            provider_type: raw.provider_type,
            endpoint: raw.endpoint.unwrap_or_default(),
            api_key: raw.api_key,
            api_path: raw.api_path,
            models: raw.models.into_iter().map(ModelInfo::from).collect(),
        }
    }
}

impl ModelProviderConfig {
    /// Ensure a model exists in this provider's model list
    pub fn ensure_model(&mut self, model: &str) {
        if self.models.iter().all(|info| info.name != model) {
            self.models.push(ModelInfo {
                name: model.to_string(),
                display_name: None,
            });
        }
    }

    /// Check if this is an Ollama provider (case-insensitive).
    ///
    /// ```
    /// use toolchat_core::config::ModelProviderConfig;
    ///
    /// let provider = ModelProviderConfig {
    ///     id: "local".to_string(),
    ///     provider_type: "ollama".to_string(),
    ///     endpoint: "http://localhost:11434".to_string(),
    ///     api_key: None,
    ///     api_path: None,
    ///     models: vec![],
    /// };
    /// assert!(provider.is_ollama());
    /// assert!(!provider.requires_api_key());
    /// ```
    pub fn is_ollama(&self) -> bool {
        matches!(
            self.provider_type.to_lowercase().as_str(),
            "ollama" | "localai"
        )
    }

    pub fn is_gemini(&self) -> bool {
        matches!(
            self.provider_type.to_lowercase().as_str(),
            "gemini" | "google" | "google-ai"
        )
    }

    /// Every hosted backend needs a key; only local Ollama-style servers do not.
    pub fn requires_api_key(&self) -> bool {
        !self.is_ollama()
    }

    /// Reads the key from the environment variable named by `api_key`.
    pub fn resolve_api_key(&self) -> Result<Option<String>, ConfigError> {
        let Some(var) = self.api_key.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        match env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
            Ok(_) => Err(ConfigError::MissingCredential {
                provider: self.id.clone(),
                reason: format!("environment variable '{var}' is empty"),
            }),
            Err(_) => Err(ConfigError::MissingCredential {
                provider: self.id.clone(),
                reason: format!("environment variable '{var}' is not set"),
            }),
        }
    }

    pub fn ensure_credential(&self) -> Result<(), ConfigError> {
        if !self.requires_api_key() {
            return Ok(());
        }
        match self.resolve_api_key()? {
            Some(_) => Ok(()),
            None => Err(ConfigError::MissingCredential {
                provider: self.id.clone(),
                reason: "no 'api_key' environment variable is configured".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(provider_type: &str, api_key: Option<&str>) -> ModelProviderConfig {
        ModelProviderConfig {
            id: "p".into(),
            provider_type: provider_type.into(),
            endpoint: "http://example.com".into(),
            api_key: api_key.map(String::from),
            api_path: None,
            models: vec![],
        }
    }

    #[test]
    fn ollama_needs_no_credential() {
        assert!(provider("ollama", None).ensure_credential().is_ok());
    }

    #[test]
    fn hosted_provider_without_key_is_fatal() {
        let err = provider("gemini", None)
            .ensure_credential()
            .expect_err("key required");
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn unset_environment_variable_is_reported() {
        let err = provider("openai", Some("TOOLCHAT_TEST_SURELY_UNSET_KEY"))
            .ensure_credential()
            .expect_err("variable unset");
        assert!(err.to_string().contains("TOOLCHAT_TEST_SURELY_UNSET_KEY"));
    }

    #[test]
    fn ensure_model_adds_missing_entry_once() {
        let mut config = provider("gemini", None);
        config.ensure_model("gemini-2.0-flash");
        config.ensure_model("gemini-2.0-flash");
        assert_eq!(config.models.len(), 1);
    }
}
