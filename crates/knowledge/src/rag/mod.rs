//! Retrieval-augmented answering.
//!
//! Retrieves tenant-scoped chunks, generates a grounded answer via the routed
//! model, masks it for the caller and records the query.

pub mod confidence;
pub mod generate;
pub mod messages;
pub mod pipeline;
pub mod retrieve;
pub mod sources;
pub mod types;

pub use generate::AnswerGenerator;
pub use pipeline::{PipelineSettings, RagPipeline};
pub use retrieve::{build_filter, Retriever};
pub use types::{
    AnswerStatus, GeneratedAnswer, RagResult, RetrievalOutcome, RetrievedChunk, SourceMetadata,
    SourceSummary,
};
