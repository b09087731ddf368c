//! LLM provider factory.
//!
//! Creates LLM clients from provider configuration, resolving secrets from
//! the environment, and assembles the two-slot [`ModelRouter`].

use crate::client::LlmClient;
use crate::providers::{ClaudeClient, OllamaClient, OpenAiClient};
use crate::router::{ModelRouter, RoutedModel};
use ragdesk_core::config::{AppConfig, GenerationConfig, ModelConfig, ProviderConfig};
use ragdesk_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client for a provider configuration.
///
/// # Arguments
/// * `provider` - Provider configuration (type, model, endpoint)
/// * `api_key` - API key for hosted providers
///
/// # Errors
/// Returns a configuration error if a hosted provider has no API key.
pub fn create_client(
    provider: &ProviderConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider {
        ProviderConfig::Ollama { endpoint, .. } => {
            Ok(Arc::new(OllamaClient::with_base_url(endpoint.as_str())))
        }
        ProviderConfig::OpenAI {
            endpoint,
            organization_env,
            ..
        } => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let mut client = match endpoint {
                Some(endpoint) => OpenAiClient::with_base_url(endpoint.as_str(), api_key),
                None => OpenAiClient::new(api_key),
            };
            if let Some(org) = organization_env
                .as_deref()
                .and_then(|env_var| std::env::var(env_var).ok())
            {
                client = client.with_organization(org);
            }
            Ok(Arc::new(client))
        }
        ProviderConfig::Claude {
            endpoint,
            api_version,
            ..
        } => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Claude provider requires API key".to_string())
            })?;
            let mut client = match endpoint {
                Some(endpoint) => ClaudeClient::with_base_url(endpoint.as_str(), api_key),
                None => ClaudeClient::new(api_key),
            };
            if let Some(version) = api_version {
                client = client.with_api_version(version.as_str());
            }
            Ok(Arc::new(client))
        }
    }
}

/// Build one routed model slot, resolving its API key from the environment.
pub fn create_routed_model(slot: &ModelConfig) -> AppResult<RoutedModel> {
    let api_key = AppConfig::resolve_api_key(&slot.provider);
    let client = create_client(&slot.provider, api_key.as_deref())?;

    tracing::debug!(
        provider = slot.provider.provider_name(),
        model = slot.provider.model(),
        "Created generation client"
    );

    Ok(RoutedModel::new(
        client,
        slot.provider.model(),
        slot.temperature,
        slot.max_tokens,
    ))
}

/// Build the default/extended model router from generation configuration.
pub fn create_router(config: &GenerationConfig) -> AppResult<ModelRouter> {
    Ok(ModelRouter::new(
        create_routed_model(&config.default_model)?,
        create_routed_model(&config.extended_model)?,
        config.routing_threshold_tokens,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> ProviderConfig {
        ProviderConfig::Ollama {
            endpoint: "http://localhost:11434".to_string(),
            model: model.to_string(),
        }
    }

    #[test]
    fn test_create_ollama_client() {
        let client = create_client(&ollama("llama3.2"), None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_openai_requires_api_key() {
        let provider = ProviderConfig::OpenAI {
            api_key_env: "UNUSED".to_string(),
            model: "gpt-4".to_string(),
            endpoint: None,
            organization_env: None,
        };
        match create_client(&provider, None) {
            Err(err) => assert!(err.to_string().contains("OpenAI provider requires API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
        let client = create_client(&provider, Some("sk-test")).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_claude_requires_api_key() {
        let provider = ProviderConfig::Claude {
            api_key_env: "UNUSED".to_string(),
            model: "claude-3-haiku-20240307".to_string(),
            endpoint: Some("http://localhost:9999/v1".to_string()),
            api_version: None,
        };
        assert!(create_client(&provider, None).is_err());
        let client = create_client(&provider, Some("key")).unwrap();
        assert_eq!(client.provider_name(), "claude");
    }

    #[test]
    fn test_create_router_from_local_config() {
        let mut config = GenerationConfig::default();
        config.default_model.provider = ollama("llama3.2");
        config.extended_model.provider = ollama("llama3.1:70b");
        config.routing_threshold_tokens = 2048;

        let router = create_router(&config).unwrap();
        assert_eq!(router.threshold_tokens(), 2048);
        assert_eq!(router.select(10).1.model(), "llama3.2");
        assert_eq!(router.select(4096).1.model(), "llama3.1:70b");
    }
}
