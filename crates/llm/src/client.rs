//! Completion client contract shared by the hosted and local providers.

use ragdesk_core::AppResult;
use serde::{Deserialize, Serialize};

/// One grounded completion: a system instruction plus a rendered user prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,

    /// Provider-side model name, e.g. "gpt-4" or "claude-3-haiku-20240307"
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Completion length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Why the model stopped producing text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of the answer
    #[default]
    Complete,
    /// Cut off by `max_tokens`
    Length,
    /// Anything else the provider reported (content filter, tool use, ...)
    Other(String),
}

impl StopReason {
    /// Map a provider's raw reason string. Each API spells these differently:
    /// OpenAI `stop`/`length`, Claude `end_turn`/`max_tokens`, Ollama `stop`/`length`.
    pub fn from_provider(raw: Option<&str>) -> Self {
        match raw {
            None | Some("stop") | Some("end_turn") | Some("stop_sequence") => Self::Complete,
            Some("length") | Some("max_tokens") => Self::Length,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Length)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,

    /// Model that actually served the request (may be a dated snapshot name)
    pub model: String,

    #[serde(default)]
    pub stop_reason: StopReason,

    #[serde(default)]
    pub usage: LlmUsage,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// A model backend that can answer a single prompt.
///
/// Implementations must be shareable across concurrent queries; the
/// pipeline holds them behind `Arc` and never serializes calls.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider name recorded on answers ("openai", "claude", "ollama").
    fn provider_name(&self) -> &str;

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
