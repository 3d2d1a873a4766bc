//! Dynamic model provider with multiple backends

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

use super::factory::ProviderFactory;
use super::traits::{ModelClient, ModelProvider};
use super::types::{ModelError, ModelRequest, ModelResponse};
use crate::config::ModelProviderConfig;

/// Runtime container for a provider backend
struct ProviderRuntime {
    models: HashSet<String>,
    client: Box<dyn ModelClient>,
}

impl ProviderRuntime {
    fn supports(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.contains(model)
    }
}

/// Routes each request to the backend registered under `request.provider`.
#[derive(Default)]
pub struct DynamicModelProvider {
    backends: HashMap<String, ProviderRuntime>,
}

impl DynamicModelProvider {
    /// Create provider from config list using factory
    pub fn from_configs(
        configs: &[ModelProviderConfig],
        timeout: Option<Duration>,
    ) -> Result<Self, ModelError> {
        let mut backends = HashMap::new();

        for config in configs {
            let models: HashSet<String> = config.models.iter().map(|m| m.name.clone()).collect();
            let client = ProviderFactory::create(config, timeout);
            debug!(provider = config.id.as_str(), models = models.len(), "Registered model backend");
            backends.insert(config.id.clone(), ProviderRuntime { models, client });
        }

        Ok(Self { backends })
    }

    /// Check if provider exists
    pub fn contains(&self, provider: &str) -> bool {
        self.backends.contains_key(provider)
    }
}

#[async_trait]
impl ModelProvider for DynamicModelProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let provider_id = &request.provider;

        let runtime = self
            .backends
            .get(provider_id)
            .ok_or_else(|| ModelError::provider_not_found(provider_id))?;

        if !runtime.supports(&request.model) {
            return Err(ModelError::model_not_found(provider_id, &request.model));
        }

        runtime.client.chat(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelInfo;
    use crate::types::{ChatMessage, MessageRole};

    fn provider() -> DynamicModelProvider {
        DynamicModelProvider::from_configs(
            &[ModelProviderConfig {
                id: "local".into(),
                provider_type: "ollama".into(),
                endpoint: "http://127.0.0.1:9".into(),
                api_key: None,
                api_path: None,
                models: vec![ModelInfo {
                    name: "llama3.2".into(),
                    display_name: None,
                }],
            }],
            Some(Duration::from_secs(1)),
        )
        .expect("provider")
    }

    fn request(provider: &str, model: &str) -> ModelRequest {
        ModelRequest {
            provider: provider.into(),
            model: model.into(),
            messages: vec![ChatMessage::new(MessageRole::User, "hi")],
            tools: vec![],
            session_id: None,
        }
    }

    #[tokio::test]
    async fn unknown_provider_is_rejected_before_any_request() {
        let provider = provider();
        assert!(provider.contains("local"));
        let err = provider.chat(request("remote", "llama3.2")).await.expect_err("unknown");
        assert!(matches!(err, ModelError::ProviderNotFound { .. }));
    }

    #[tokio::test]
    async fn unlisted_model_is_rejected() {
        let err = provider()
            .chat(request("local", "mistral"))
            .await
            .expect_err("unlisted");
        assert!(matches!(err, ModelError::ModelNotFound { .. }));
    }
}
