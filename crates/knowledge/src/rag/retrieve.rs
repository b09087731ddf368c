//! Tenant-scoped document retrieval.

use super::types::{RetrievalOutcome, RetrievedChunk};
use crate::masking::MaskPolicy;
use crate::types::QueryFilter;
use crate::vector_index::{rank_order, SearchFilter, VectorIndex};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Build the composite filter for one query.
///
/// The tenant is mandatory. Caller document types are intersected with the
/// policy's allowed types; without caller types the allowed set is used as is.
pub fn build_filter(
    tenant_id: &str,
    filters: Option<&QueryFilter>,
    policy: &MaskPolicy,
) -> SearchFilter {
    let doc_types = match filters.and_then(|f| f.doc_types.as_ref()) {
        Some(requested) => requested
            .iter()
            .copied()
            .filter(|t| policy.allows(*t))
            .collect::<BTreeSet<_>>(),
        None => policy.allowed_doc_types.clone(),
    };

    let mut filter = SearchFilter::new(tenant_id, doc_types);
    if let Some(filters) = filters {
        filter.store_ids = filters.store_ids.clone();
        filter.project_ids = filters.project_ids.clone();
        filter.date_range = filters.date_range;
    }
    filter
}

/// Runs similarity search against a [`VectorIndex`] with a timeout.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    timeout: Duration,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, timeout: Duration) -> Self {
        Self { index, timeout }
    }

    /// Retrieve up to `top_k` chunks. Never fails: errors and timeouts come
    /// back as [`RetrievalOutcome::Failed`].
    pub async fn retrieve(
        &self,
        query_text: &str,
        tenant_id: &str,
        filters: Option<&QueryFilter>,
        policy: &MaskPolicy,
        top_k: usize,
    ) -> RetrievalOutcome {
        let filter = build_filter(tenant_id, filters, policy);
        if filter.doc_types.is_empty() {
            tracing::info!(tenant = %tenant_id, "No permitted document types, skipping search");
            return RetrievalOutcome::Skipped;
        }

        let search = self.index.similarity_search(query_text, &filter, top_k);
        let hits = match tokio::time::timeout(self.timeout, search).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                tracing::warn!(tenant = %tenant_id, "Similarity search failed: {}", e);
                return RetrievalOutcome::Failed(e.to_string());
            }
            Err(_) => {
                tracing::warn!(
                    tenant = %tenant_id,
                    "Similarity search timed out after {:?}",
                    self.timeout
                );
                return RetrievalOutcome::Failed(format!(
                    "search timed out after {:?}",
                    self.timeout
                ));
            }
        };

        let mut chunks: Vec<RetrievedChunk> = hits
            .into_iter()
            .filter(|hit| {
                if hit.metadata.tenant_id != tenant_id {
                    tracing::warn!(
                        tenant = %tenant_id,
                        foreign_tenant = %hit.metadata.tenant_id,
                        document_id = %hit.metadata.document_id,
                        "Discarding hit from another tenant"
                    );
                    return false;
                }
                if !hit.score.is_finite() {
                    tracing::warn!(
                        document_id = %hit.metadata.document_id,
                        "Discarding hit with non-finite score"
                    );
                    return false;
                }
                true
            })
            .map(RetrievedChunk::from)
            .collect();

        chunks.sort_by(|a, b| {
            rank_order(
                (a.score, a.document_id.as_str(), a.chunk_index),
                (b.score, b.document_id.as_str(), b.chunk_index),
            )
        });
        chunks.truncate(top_k);

        tracing::debug!(tenant = %tenant_id, chunks = chunks.len(), "Retrieval complete");
        RetrievalOutcome::Found(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMetadata, DateRange, DocType};
    use crate::vector_index::SearchHit;
    use chrono::NaiveDate;
    use ragdesk_core::{AppError, AppResult};
    use std::sync::Mutex;

    /// Returns canned hits and remembers the last filter it saw.
    struct CannedIndex {
        hits: Vec<SearchHit>,
        seen: Mutex<Option<SearchFilter>>,
    }

    impl CannedIndex {
        fn new(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                seen: Mutex::new(None),
            }
        }

        fn seen(&self) -> Option<SearchFilter> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl VectorIndex for CannedIndex {
        async fn similarity_search(
            &self,
            _query_text: &str,
            filter: &SearchFilter,
            _top_k: usize,
        ) -> AppResult<Vec<SearchHit>> {
            *self.seen.lock().unwrap() = Some(filter.clone());
            Ok(self.hits.clone())
        }

        async fn reindex_tenant(&self, _tenant_id: &str) -> AppResult<usize> {
            Ok(0)
        }
    }

    struct FailingIndex;

    #[async_trait::async_trait]
    impl VectorIndex for FailingIndex {
        async fn similarity_search(
            &self,
            _query_text: &str,
            _filter: &SearchFilter,
            _top_k: usize,
        ) -> AppResult<Vec<SearchHit>> {
            Err(AppError::Knowledge("connection refused".to_string()))
        }

        async fn reindex_tenant(&self, _tenant_id: &str) -> AppResult<usize> {
            Ok(0)
        }
    }

    struct SlowIndex;

    #[async_trait::async_trait]
    impl VectorIndex for SlowIndex {
        async fn similarity_search(
            &self,
            _query_text: &str,
            _filter: &SearchFilter,
            _top_k: usize,
        ) -> AppResult<Vec<SearchHit>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }

        async fn reindex_tenant(&self, _tenant_id: &str) -> AppResult<usize> {
            Ok(0)
        }
    }

    fn hit(tenant: &str, doc: &str, index: u32, score: f32) -> SearchHit {
        SearchHit {
            text: format!("{} chunk {}", doc, index),
            metadata: ChunkMetadata {
                tenant_id: tenant.to_string(),
                document_id: doc.to_string(),
                file_name: format!("{}.pdf", doc),
                doc_type: DocType::ManualMd,
                chunk_index: index,
                page_number: None,
                store_id: None,
                project_id: None,
                document_date: None,
            },
            score,
        }
    }

    fn policy(allowed: &[DocType]) -> MaskPolicy {
        MaskPolicy {
            allowed_doc_types: allowed.iter().copied().collect(),
            ..MaskPolicy::unrestricted()
        }
    }

    fn retriever(index: Arc<dyn VectorIndex>) -> Retriever {
        Retriever::new(index, Duration::from_secs(1))
    }

    #[test]
    fn test_filter_intersects_caller_types_with_policy() {
        let filters = QueryFilter::default()
            .with_doc_types(vec![DocType::CostPdf, DocType::ManualMd]);
        let filter = build_filter(
            "T1",
            Some(&filters),
            &policy(&[DocType::ManualMd, DocType::EstimatePdf]),
        );

        assert_eq!(filter.tenant_id, "T1");
        assert_eq!(
            filter.doc_types,
            [DocType::ManualMd].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_filter_without_caller_types_uses_policy() {
        let date_range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: None,
        };
        let filters = QueryFilter::default()
            .with_store_ids(vec!["S1".to_string()])
            .with_date_range(date_range);
        let filter = build_filter("T1", Some(&filters), &policy(&[DocType::EstimatePdf]));

        assert_eq!(
            filter.doc_types,
            [DocType::EstimatePdf].into_iter().collect::<BTreeSet<_>>()
        );
        assert_eq!(filter.store_ids, Some(vec!["S1".to_string()]));
        assert_eq!(filter.date_range, Some(date_range));
    }

    #[tokio::test]
    async fn test_empty_effective_types_skip_search() {
        let index = Arc::new(CannedIndex::new(vec![hit("T1", "a", 0, 0.9)]));
        let filters = QueryFilter::default().with_doc_types(vec![DocType::CostPdf]);

        let outcome = retriever(index.clone())
            .retrieve("q", "T1", Some(&filters), &policy(&[DocType::ManualMd]), 5)
            .await;

        assert_eq!(outcome, RetrievalOutcome::Skipped);
        assert!(index.seen().is_none());
    }

    #[tokio::test]
    async fn test_orders_by_score_then_document_then_chunk() {
        let index = Arc::new(CannedIndex::new(vec![
            hit("T1", "b", 1, 0.5),
            hit("T1", "b", 0, 0.5),
            hit("T1", "a", 3, 0.5),
            hit("T1", "c", 0, 0.9),
        ]));

        let chunks = retriever(index)
            .retrieve("q", "T1", None, &MaskPolicy::unrestricted(), 3)
            .await
            .into_chunks();

        let order: Vec<(&str, u32)> = chunks
            .iter()
            .map(|c| (c.document_id.as_str(), c.chunk_index))
            .collect();
        assert_eq!(order, vec![("c", 0), ("a", 3), ("b", 0)]);
    }

    #[tokio::test]
    async fn test_discards_foreign_and_non_finite_hits() {
        let index = Arc::new(CannedIndex::new(vec![
            hit("T1", "ok", 0, 0.7),
            hit("T2", "leak", 0, 0.99),
            hit("T1", "nan", 0, f32::NAN),
        ]));

        let chunks = retriever(index)
            .retrieve("q", "T1", None, &MaskPolicy::unrestricted(), 5)
            .await
            .into_chunks();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].document_id, "ok");
    }

    #[tokio::test]
    async fn test_index_error_is_failed_outcome() {
        let outcome = retriever(Arc::new(FailingIndex))
            .retrieve("q", "T1", None, &MaskPolicy::unrestricted(), 5)
            .await;
        assert!(matches!(outcome, RetrievalOutcome::Failed(msg) if msg.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_timeout_is_failed_outcome() {
        let retriever = Retriever::new(Arc::new(SlowIndex), Duration::from_millis(20));
        let outcome = retriever
            .retrieve("q", "T1", None, &MaskPolicy::unrestricted(), 5)
            .await;
        assert!(matches!(outcome, RetrievalOutcome::Failed(_)));
    }
}
