//! Vector index abstraction for tenant-scoped chunk retrieval.
//!
//! Defines the contract the retriever needs from a similarity search backend.

use crate::types::{ChunkMetadata, DateRange, DocType};
use ragdesk_core::AppResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Composite search filter. Every field is a conjunctive constraint.
///
/// `tenant_id` is always applied. `doc_types` is the effective set after
/// policy intersection; an empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub tenant_id: String,
    pub doc_types: BTreeSet<DocType>,
    pub store_ids: Option<Vec<String>>,
    pub project_ids: Option<Vec<String>>,
    pub date_range: Option<DateRange>,
}

impl SearchFilter {
    pub fn new(tenant_id: impl Into<String>, doc_types: BTreeSet<DocType>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            doc_types,
            store_ids: None,
            project_ids: None,
            date_range: None,
        }
    }

    /// Whether a chunk passes every constraint.
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        if metadata.tenant_id != self.tenant_id {
            return false;
        }

        if !self.doc_types.contains(&metadata.doc_type) {
            return false;
        }

        if let Some(store_ids) = &self.store_ids {
            match &metadata.store_id {
                Some(store) if store_ids.contains(store) => {}
                _ => return false,
            }
        }

        if let Some(project_ids) = &self.project_ids {
            match &metadata.project_id {
                Some(project) if project_ids.contains(project) => {}
                _ => return false,
            }
        }

        // Undated chunks never satisfy a date constraint
        if let Some(range) = &self.date_range {
            match metadata.document_date {
                Some(date) if range.contains(date) => {}
                _ => return false,
            }
        }

        true
    }
}

/// One similarity search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

impl SearchHit {
    pub fn rank_key(&self) -> (f32, &str, u32) {
        (self.score, self.metadata.document_id.as_str(), self.metadata.chunk_index)
    }
}

/// Result ranking: score descending, then `document_id` and `chunk_index`
/// ascending. Backends sort with this before cutting to `top_k` so equal
/// scores at the cutoff resolve the same way on every run.
pub fn rank_order(a: (f32, &str, u32), b: (f32, &str, u32)) -> Ordering {
    b.0.total_cmp(&a.0)
        .then_with(|| a.1.cmp(b.1))
        .then_with(|| a.2.cmp(&b.2))
}

/// Trait for vector index backends.
///
/// Implementations must:
/// - Only return hits that pass the filter
/// - Return at most `top_k` hits, cut after sorting by [`rank_order`]
/// - Re-embed a tenant's chunks on request
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Search for the chunks most similar to `query_text`.
    async fn similarity_search(
        &self,
        query_text: &str,
        filter: &SearchFilter,
        top_k: usize,
    ) -> AppResult<Vec<SearchHit>>;

    /// Rebuild embeddings for one tenant's chunks, returning how many were
    /// processed.
    async fn reindex_tenant(&self, tenant_id: &str) -> AppResult<usize>;
}
