//! Embedding generation for the in-memory index.

pub mod provider;
pub mod providers;

pub use provider::EmbeddingProvider;
pub use providers::HashingProvider;
