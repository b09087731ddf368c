//! Grounded answer generation.

use super::types::{GeneratedAnswer, RetrievedChunk};
use crate::tokens::TokenCounter;
use ragdesk_core::AppResult;
use ragdesk_llm::{GenerationProvider, ModelRouter};
use ragdesk_prompt::{build_prompt, ContextPassage, PromptDefinition};
use std::time::Duration;

/// Builds the grounding prompt and calls the routed model.
#[derive(Debug, Clone)]
pub struct AnswerGenerator {
    router: ModelRouter,
    prompt: PromptDefinition,
    tokens: TokenCounter,
    timeout: Duration,
    apology: String,
}

impl AnswerGenerator {
    pub fn new(
        router: ModelRouter,
        prompt: PromptDefinition,
        tokens: TokenCounter,
        timeout: Duration,
        apology: impl Into<String>,
    ) -> Self {
        Self {
            router,
            prompt,
            tokens,
            timeout,
            apology: apology.into(),
        }
    }

    /// Token estimate of the query plus every chunk text.
    pub fn estimate_tokens(&self, query_text: &str, chunks: &[RetrievedChunk]) -> usize {
        self.tokens
            .estimate_context(query_text, chunks.iter().map(|c| c.text.as_str()))
    }

    pub fn route(&self, token_estimate: usize) -> GenerationProvider {
        GenerationProvider::route(token_estimate, self.router.threshold_tokens())
    }

    /// Generate an answer from the retrieved chunks.
    ///
    /// Model failures and timeouts degrade to the apology message. Only a
    /// prompt that cannot be rendered is an error.
    pub async fn generate(
        &self,
        query_text: &str,
        chunks: &[RetrievedChunk],
    ) -> AppResult<GeneratedAnswer> {
        let token_estimate = self.estimate_tokens(query_text, chunks);
        let (provider, slot) = self.router.select(token_estimate);

        tracing::info!(
            provider = provider.as_str(),
            model = slot.model(),
            token_estimate,
            chunks = chunks.len(),
            "Generating answer"
        );

        let passages: Vec<ContextPassage> = chunks
            .iter()
            .map(|c| ContextPassage::new(c.file_name.clone(), c.text.clone()))
            .collect();
        let built = build_prompt(&self.prompt, query_text, &passages)?;

        let mut request = slot.request(built.user);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        match tokio::time::timeout(self.timeout, slot.client().complete(&request)).await {
            Ok(Ok(response)) => {
                if response.stop_reason.is_truncated() {
                    tracing::warn!(
                        provider = provider.as_str(),
                        completion_tokens = response.usage.completion_tokens,
                        "Answer was cut off at the token limit"
                    );
                }
                Ok(GeneratedAnswer::Answered {
                    text: response.content,
                    provider,
                    model: slot.model().to_string(),
                })
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = provider.as_str(), "Model call failed: {}", e);
                Ok(self.degraded(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    provider = provider.as_str(),
                    "Model call timed out after {:?}",
                    self.timeout
                );
                Ok(self.degraded(format!("model call timed out after {:?}", self.timeout)))
            }
        }
    }

    fn degraded(&self, reason: String) -> GeneratedAnswer {
        GeneratedAnswer::Degraded {
            text: self.apology.clone(),
            reason,
        }
    }
}
