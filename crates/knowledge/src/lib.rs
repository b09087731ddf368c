//! Tenant-scoped retrieval-augmented answering.
//!
//! Turns a question plus an authenticated caller into a policy-filtered,
//! masked, confidence-scored and audited answer over the caller's tenant
//! corpus.

pub mod admin;
pub mod audit;
pub mod embeddings;
pub mod jsonl;
pub mod masking;
pub mod memory_index;
pub mod metrics;
pub mod rag;
pub mod tokens;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use admin::{reindex, ReindexReceipt};
pub use audit::{AuditSink, JsonlAuditLog, NullAuditSink, QueryLogEntry};
pub use embeddings::{EmbeddingProvider, HashingProvider};
pub use masking::{apply_output_masking, MaskPolicy, MaskPolicyResolver};
pub use memory_index::MemoryIndex;
pub use metrics::{MetricsSink, MetricsSnapshot, QueryMetrics};
pub use rag::{AnswerStatus, RagPipeline, RagResult, SourceSummary};
pub use tokens::TokenCounter;
pub use types::{
    ChunkMetadata, DateRange, DocType, IndexedChunk, Query, QueryFilter, UserIdentity,
};
pub use vector_index::{SearchFilter, SearchHit, VectorIndex};
