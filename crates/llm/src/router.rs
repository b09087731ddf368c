//! Two-slot model router.
//!
//! Holds the default and extended-context generation models and picks one
//! per request from the estimated prompt size.

use crate::client::{LlmClient, LlmRequest};
use crate::types::GenerationProvider;
use std::sync::Arc;

/// A generation client bound to a model and sampling settings.
#[derive(Clone)]
pub struct RoutedModel {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl RoutedModel {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build a request for this slot's model and sampling settings.
    pub fn request(&self, prompt: impl Into<String>) -> LlmRequest {
        LlmRequest::new(prompt, self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

impl std::fmt::Debug for RoutedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutedModel")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Routes requests between the default and extended-context models.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    default: RoutedModel,
    extended: RoutedModel,
    threshold_tokens: usize,
}

impl ModelRouter {
    pub fn new(default: RoutedModel, extended: RoutedModel, threshold_tokens: usize) -> Self {
        Self {
            default,
            extended,
            threshold_tokens,
        }
    }

    pub fn threshold_tokens(&self) -> usize {
        self.threshold_tokens
    }

    /// Model slot for a routing decision.
    pub fn model(&self, provider: GenerationProvider) -> &RoutedModel {
        match provider {
            GenerationProvider::Default => &self.default,
            GenerationProvider::ExtendedContext => &self.extended,
        }
    }

    /// Pick the slot for an estimated prompt size.
    pub fn select(&self, token_estimate: usize) -> (GenerationProvider, &RoutedModel) {
        let provider = GenerationProvider::route(token_estimate, self.threshold_tokens);
        (provider, self.model(provider))
    }
}
