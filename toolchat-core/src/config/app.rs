use super::error::ConfigError;
use super::provider::ModelProviderConfig;
use super::server::ServerConfig;
use crate::constants::DEFAULT_MAX_TOOL_ROUNDS;
use std::path::Path;
use std::time::Duration;

/// Application configuration loaded from client.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    /// Tool-result batches allowed per user turn; `0` disables the bound.
    pub max_tool_rounds: usize,
    pub request_timeout: Option<Duration>,
    pub tool_timeout: Option<Duration>,
    pub server: ServerConfig,
    pub providers: Vec<ModelProviderConfig>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    pub fn default_max_tool_rounds() -> usize {
        DEFAULT_MAX_TOOL_ROUNDS
    }

    pub fn provider(&self, id: &str) -> Option<&ModelProviderConfig> {
        self.providers.iter().find(|provider| provider.id == id)
    }

    /// Resolves the credential of the provider that will serve requests.
    ///
    /// A missing key is fatal: the caller is expected to exit before any chat starts.
    pub fn ensure_credentials(&self, provider_id: &str) -> Result<(), ConfigError> {
        let provider = self
            .provider(provider_id)
            .ok_or_else(|| ConfigError::ProviderNotFound {
                provider: provider_id.to_string(),
            })?;
        provider.ensure_credential()
    }
}
