//! Provider factory - creates clients from config

use super::clients::{GeminiClient, OllamaClient, OpenAIClient};
use super::traits::ModelClient;
use crate::config::ModelProviderConfig;
use std::time::Duration;
use tracing::warn;

/// Resolve the provider's API key from the environment, logging instead of failing.
///
/// Startup checks the default provider's key; a missing key for any other provider only
/// surfaces when that provider is first used.
pub fn resolve_api_key(config: &ModelProviderConfig) -> Option<String> {
    match config.resolve_api_key() {
        Ok(key) => key,
        Err(err) => {
            warn!(provider = config.id.as_str(), %err, "API key is unavailable");
            None
        }
    }
}

/// Factory for creating model clients from provider config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates a model client based on provider type.
    ///
    /// Supported types:
    /// - `ollama`, `localai` → Ollama format
    /// - `gemini`, `google` → Gemini format
    /// - Others → OpenAI-compatible format (default)
    pub fn create(config: &ModelProviderConfig, timeout: Option<Duration>) -> Box<dyn ModelClient> {
        if config.is_ollama() {
            Box::new(OllamaClient::from_config(config, timeout))
        } else if config.is_gemini() {
            Box::new(GeminiClient::from_config(config, timeout))
        } else {
            Box::new(OpenAIClient::from_config(config, timeout))
        }
    }
}
