//! LLM integration crate for ragdesk.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! Large Language Models and the routing rule that picks between the default
//! and the extended-context model.
//!
//! # Providers
//! - **OpenAI**: chat completions (default slot)
//! - **Claude**: Anthropic messages (extended-context slot)
//! - **Ollama**: local runtime
//!
//! # Example
//! ```no_run
//! use ragdesk_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod router;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage, StopReason};
pub use factory::{create_client, create_router};
pub use router::{ModelRouter, RoutedModel};
pub use types::GenerationProvider;
