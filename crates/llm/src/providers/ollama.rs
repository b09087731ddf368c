//! Local Ollama runtime, via `/api/generate` with streaming off.

use super::read_json;
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage, StopReason};
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    options: SamplingOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Ollama's name for the completion length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    model: String,
    response: String,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

impl From<GenerateResponse> for LlmResponse {
    fn from(raw: GenerateResponse) -> Self {
        LlmResponse {
            stop_reason: StopReason::from_provider(raw.done_reason.as_deref()),
            usage: LlmUsage::new(raw.prompt_eval_count, raw.eval_count),
            content: raw.response,
            model: raw.model,
        }
    }
}

/// Client for a self-hosted model; needs no API key.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn generate_request<'a>(&self, request: &'a LlmRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            options: SamplingOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        }
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, base_url = %self.base_url, "Ollama generate");

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.generate_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to reach Ollama at {}: {}", self.base_url, e)))?;

        let raw: GenerateResponse = read_json("Ollama", response).await?;
        Ok(raw.into())
    }
}
