//! Grounding prompts for ragdesk.
//!
//! This crate provides:
//! - Built-in per-language grounding prompts
//! - YAML prompt overrides
//! - Handlebars rendering of the query and retrieved context

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, render_context};
pub use loader::{builtin_prompt, load_prompt_file, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, ContextPassage, PromptDefinition};
