//! Generation routing types.

use serde::{Deserialize, Serialize};

/// Which of the two configured generation models serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProvider {
    /// Default model for contexts that fit under the threshold
    Default,
    /// Higher-context-window model
    ExtendedContext,
}

impl GenerationProvider {
    /// Route by estimated token count: strictly above `threshold` goes to
    /// the extended-context model.
    pub fn route(token_estimate: usize, threshold: usize) -> Self {
        if token_estimate > threshold {
            Self::ExtendedContext
        } else {
            Self::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ExtendedContext => "extended_context",
        }
    }
}
