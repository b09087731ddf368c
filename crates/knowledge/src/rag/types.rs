//! RAG response types.

use crate::types::DocType;
use crate::vector_index::SearchHit;
use ragdesk_llm::GenerationProvider;
use serde::{Deserialize, Serialize};

/// A scored chunk handed from retrieval to generation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    pub chunk_index: u32,
    pub page_number: Option<u32>,
    pub document_id: String,
    pub file_name: String,
    pub doc_type: DocType,
    pub tenant_id: String,
    pub score: f32,
}

impl From<SearchHit> for RetrievedChunk {
    fn from(hit: SearchHit) -> Self {
        let metadata = hit.metadata;
        Self {
            text: hit.text,
            chunk_index: metadata.chunk_index,
            page_number: metadata.page_number,
            document_id: metadata.document_id,
            file_name: metadata.file_name,
            doc_type: metadata.doc_type,
            tenant_id: metadata.tenant_id,
            score: hit.score,
        }
    }
}

/// What retrieval produced. `Failed` and `Skipped` both feed the no-results
/// path; the distinction is kept for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    Found(Vec<RetrievedChunk>),
    /// The caller may not see any of the requested document types
    Skipped,
    Failed(String),
}

impl RetrievalOutcome {
    pub fn into_chunks(self) -> Vec<RetrievedChunk> {
        match self {
            RetrievalOutcome::Found(chunks) => chunks,
            RetrievalOutcome::Skipped | RetrievalOutcome::Failed(_) => Vec::new(),
        }
    }
}

/// Raw (unmasked) generation result.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedAnswer {
    Answered {
        text: String,
        provider: GenerationProvider,
        model: String,
    },
    /// Model call failed or timed out; `text` is the apology message
    Degraded { text: String, reason: String },
}

impl GeneratedAnswer {
    pub fn text(&self) -> &str {
        match self {
            GeneratedAnswer::Answered { text, .. } | GeneratedAnswer::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, GeneratedAnswer::Degraded { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    NoResults,
    GenerationFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub document_id: String,
    pub file_name: String,
    pub doc_type: DocType,
}

/// User-facing summary of one retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub chunk_index: u32,
    /// Masked snippet, truncated
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub confidence_score: f32,
    pub metadata: SourceMetadata,
}

/// Response from the query pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResult {
    pub answer: String,
    pub confidence: f32,
    pub sources: Vec<SourceSummary>,
    /// Document id of every retrieved chunk, in rank order
    pub retrieved_docs: Vec<String>,
    pub response_time_ms: u64,
    pub query_id: String,
    pub status: AnswerStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    #[test]
    fn test_chunk_from_hit() {
        let hit = SearchHit {
            text: "屋根の保証".to_string(),
            metadata: ChunkMetadata {
                tenant_id: "T1".to_string(),
                document_id: "doc-1".to_string(),
                file_name: "warranty.pdf".to_string(),
                doc_type: DocType::ContractPdf,
                chunk_index: 4,
                page_number: Some(2),
                store_id: None,
                project_id: None,
                document_date: None,
            },
            score: 0.72,
        };

        let chunk = RetrievedChunk::from(hit);
        assert_eq!(chunk.chunk_index, 4);
        assert_eq!(chunk.page_number, Some(2));
        assert_eq!(chunk.tenant_id, "T1");
        assert_eq!(chunk.score, 0.72);
    }

    #[test]
    fn test_failed_retrieval_is_empty() {
        assert!(RetrievalOutcome::Failed("index down".to_string())
            .into_chunks()
            .is_empty());
        assert!(RetrievalOutcome::Skipped.into_chunks().is_empty());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&AnswerStatus::NoResults).unwrap(),
            "\"no_results\""
        );
        assert_eq!(
            serde_json::to_string(&AnswerStatus::GenerationFailed).unwrap(),
            "\"generation_failed\""
        );
    }

    #[test]
    fn test_degraded_answer_text() {
        let answer = GeneratedAnswer::Degraded {
            text: "申し訳ございません".to_string(),
            reason: "timeout".to_string(),
        };
        assert!(answer.is_degraded());
        assert_eq!(answer.text(), "申し訳ございません");
    }
}
