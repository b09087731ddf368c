//! Anthropic Claude messages provider.
//!
//! API: https://docs.anthropic.com/en/api/messages

use super::read_json;
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage, StopReason};
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1";
const DEFAULT_API_VERSION: &str = "2023-06-01";

/// The messages API requires `max_tokens`.
const FALLBACK_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Claude messages client.
pub struct ClaudeClient {
    base_url: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl ClaudeClient {
    /// Create a client against the public API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT, api_key)
    }

    /// Create a client against a custom endpoint.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the `anthropic-version` header.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn to_messages_request(&self, request: &LlmRequest) -> MessagesRequest {
        MessagesRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            system: request.system.clone(),
            temperature: request.temperature,
        }
    }

    fn convert_response(&self, response: MessagesResponse) -> AppResult<LlmResponse> {
        let content: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(AppError::Llm(
                "Claude response contained no text content".to_string(),
            ));
        }

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response.model,
            stop_reason: StopReason::from_provider(response.stop_reason.as_deref()),
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for ClaudeClient {
    fn provider_name(&self) -> &str {
        "claude"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, "Sending completion request to Claude");

        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&self.to_messages_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Claude: {}", e)))?;

        let messages_response: MessagesResponse = read_json("Claude", response).await?;
        self.convert_response(messages_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_request_defaults_max_tokens() {
        let client = ClaudeClient::new("key");
        let req = client.to_messages_request(&LlmRequest::new("hello", "claude-3-haiku-20240307"));
        assert_eq!(req.max_tokens, FALLBACK_MAX_TOKENS);
        assert_eq!(req.messages.len(), 1);
        assert!(req.system.is_none());
    }

    #[test]
    fn test_messages_request_carries_system() {
        let client = ClaudeClient::new("key").with_api_version("2024-01-01");
        let req = client.to_messages_request(
            &LlmRequest::new("hello", "claude-3-haiku-20240307")
                .with_system("grounded")
                .with_max_tokens(2000),
        );
        assert_eq!(req.max_tokens, 2000);
        assert_eq!(req.system.as_deref(), Some("grounded"));
        assert_eq!(client.api_version, "2024-01-01");
    }

    #[test]
    fn test_convert_response_joins_text_blocks() {
        let client = ClaudeClient::new("key");
        let raw: MessagesResponse = serde_json::from_str(
            r#"{
                "model": "claude-3-haiku-20240307",
                "content": [{"type": "text", "text": "保証期間は"}, {"type": "text", "text": "10年です。"}],
                "stop_reason": "max_tokens",
                "usage": {"input_tokens": 3200, "output_tokens": 20}
            }"#,
        )
        .unwrap();

        let response = client.convert_response(raw).unwrap();
        assert_eq!(response.content, "保証期間は10年です。");
        assert_eq!(response.usage.prompt_tokens, 3200);
        assert!(response.stop_reason.is_truncated());
    }

    #[test]
    fn test_convert_empty_response_is_error() {
        let client = ClaudeClient::new("key");
        let raw: MessagesResponse =
            serde_json::from_str(r#"{"model": "claude", "content": []}"#).unwrap();
        assert!(client.convert_response(raw).is_err());
    }
}
