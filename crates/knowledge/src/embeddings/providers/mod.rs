//! Embedding provider implementations.

pub mod hashing;

pub use hashing::HashingProvider;
