//! LLM provider implementations.

pub mod claude;
pub mod ollama;
pub mod openai;

pub use claude::ClaudeClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use ragdesk_core::{AppError, AppResult};
use serde::de::DeserializeOwned;

/// Turn an HTTP response into the provider's JSON body, or an `AppError::Llm`
/// carrying the status and error text.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Response,
) -> AppResult<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::Llm(format!(
            "{} API error ({}): {}",
            provider, status, error_text
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Llm(format!("Failed to parse {} response: {}", provider, e)))
}
