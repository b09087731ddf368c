//! Prompt types for grounded answer generation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A grounding prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Answer language code (e.g. "ja", "en")
    pub language: String,

    /// Label placed in front of each passage's file name in the context block
    #[serde(rename = "sourceLabel")]
    pub source_label: String,

    /// Optional system message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax (`{{query}}`, `{{context}}`, `{{language}}`)
    pub template: String,
}

/// One retrieved passage as it appears in the context block.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextPassage {
    pub source: String,
    pub text: String,
}

impl ContextPassage {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Number of passages rendered into the context block
    #[serde(rename = "passageCount")]
    pub passage_count: usize,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        passage_count: usize,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                passage_count,
                resolved_variables,
            },
        }
    }
}
