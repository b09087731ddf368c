//! In-memory vector index backed by a JSONL corpus file.

use crate::embeddings::EmbeddingProvider;
use crate::jsonl;
use crate::types::IndexedChunk;
use crate::vector_index::{rank_order, SearchFilter, SearchHit, VectorIndex};
use ragdesk_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

struct Entry {
    chunk: IndexedChunk,
    embedding: Vec<f32>,
}

/// Brute-force cosine similarity index.
///
/// When built from a corpus file, [`VectorIndex::reindex_tenant`] re-reads
/// that tenant's records from the file before embedding them again.
pub struct MemoryIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    corpus_path: Option<PathBuf>,
    entries: RwLock<Vec<Entry>>,
}

impl MemoryIndex {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            corpus_path: None,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Load and embed every record of a corpus file. A missing file yields an
    /// empty index.
    pub async fn from_corpus(path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        let chunks: Vec<IndexedChunk> = jsonl::read_lines(path)?;
        let index = Self {
            embedder,
            corpus_path: Some(path.to_path_buf()),
            entries: RwLock::new(Vec::new()),
        };
        let loaded = index.insert(chunks).await?;

        tracing::info!(
            "Loaded {} chunks from corpus {:?} (embedder: {})",
            loaded,
            path,
            index.embedder.model_name()
        );

        Ok(index)
    }

    /// Embed and add chunks.
    pub async fn insert(&self, chunks: Vec<IndexedChunk>) -> AppResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let entries = self.embed_all(chunks).await?;
        let count = entries.len();
        self.entries.write().await.extend(entries);
        Ok(count)
    }

    /// Total number of chunks across tenants.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn embed_all(&self, chunks: Vec<IndexedChunk>) -> AppResult<Vec<Entry>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        Ok(chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Entry { chunk, embedding })
            .collect())
    }
}

#[async_trait::async_trait]
impl VectorIndex for MemoryIndex {
    async fn similarity_search(
        &self,
        query_text: &str,
        filter: &SearchFilter,
        top_k: usize,
    ) -> AppResult<Vec<SearchHit>> {
        if top_k == 0 || filter.doc_types.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query_text).await?;
        let entries = self.entries.read().await;

        let mut hits: Vec<SearchHit> = entries
            .iter()
            .filter(|entry| filter.matches(&entry.chunk.metadata))
            .map(|entry| SearchHit {
                text: entry.chunk.text.clone(),
                metadata: entry.chunk.metadata.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| rank_order(a.rank_key(), b.rank_key()));
        hits.truncate(top_k);

        tracing::debug!(
            tenant = %filter.tenant_id,
            hits = hits.len(),
            "Memory index search complete"
        );

        Ok(hits)
    }

    async fn reindex_tenant(&self, tenant_id: &str) -> AppResult<usize> {
        let chunks: Vec<IndexedChunk> = match &self.corpus_path {
            Some(path) => jsonl::read_lines::<IndexedChunk>(path)?
                .into_iter()
                .filter(|c| c.metadata.tenant_id == tenant_id)
                .collect(),
            None => self
                .entries
                .read()
                .await
                .iter()
                .filter(|e| e.chunk.metadata.tenant_id == tenant_id)
                .map(|e| e.chunk.clone())
                .collect(),
        };

        // Embed before taking the write lock so searches are not blocked
        let fresh = self.embed_all(chunks).await?;
        let count = fresh.len();

        let mut entries = self.entries.write().await;
        entries.retain(|e| e.chunk.metadata.tenant_id != tenant_id);
        entries.extend(fresh);

        tracing::info!(tenant = %tenant_id, chunks = count, "Reindexed tenant");
        Ok(count)
    }
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingProvider;
    use crate::types::{ChunkMetadata, DocType};
    use tempfile::TempDir;

    fn chunk(tenant: &str, doc: &str, index: u32, doc_type: DocType, text: &str) -> IndexedChunk {
        IndexedChunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                tenant_id: tenant.to_string(),
                document_id: doc.to_string(),
                file_name: format!("{}.pdf", doc),
                doc_type,
                chunk_index: index,
                page_number: None,
                store_id: None,
                project_id: None,
                document_date: None,
            },
        }
    }

    fn embedder() -> Arc<dyn EmbeddingProvider> {
        Arc::new(HashingProvider::new(256).unwrap())
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_search_is_tenant_scoped_and_ranked() {
        let index = MemoryIndex::new(embedder());
        index
            .insert(vec![
                chunk("T1", "warranty", 0, DocType::ManualMd, "屋根の保証期間は10年です"),
                chunk("T1", "inventory", 0, DocType::ManualMd, "合板の在庫は120枚"),
                chunk("T2", "warranty", 0, DocType::ManualMd, "屋根の保証期間は15年です"),
            ])
            .await
            .unwrap();

        let filter = SearchFilter::new("T1", DocType::all());
        let hits = index.similarity_search("保証期間", &filter, 5).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.metadata.tenant_id == "T1"));
        assert_eq!(hits[0].metadata.document_id, "warranty");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_equal_scores_cut_by_document_then_chunk() {
        let index = MemoryIndex::new(embedder());
        index
            .insert(vec![
                chunk("T1", "b", 0, DocType::ManualMd, "屋根 保証"),
                chunk("T1", "a", 1, DocType::ManualMd, "屋根 保証"),
                chunk("T1", "a", 0, DocType::ManualMd, "屋根 保証"),
            ])
            .await
            .unwrap();

        let filter = SearchFilter::new("T1", DocType::all());
        let hits = index.similarity_search("屋根 保証", &filter, 2).await.unwrap();
        let kept: Vec<(&str, u32)> = hits
            .iter()
            .map(|h| (h.metadata.document_id.as_str(), h.metadata.chunk_index))
            .collect();
        assert_eq!(kept, vec![("a", 0), ("a", 1)]);
    }

    #[tokio::test]
    async fn test_search_respects_top_k_and_doc_types() {
        let index = MemoryIndex::new(embedder());
        index
            .insert(
                (0..4)
                    .map(|i| chunk("T1", "manual", i, DocType::ManualMd, "保証 手順"))
                    .chain(std::iter::once(chunk(
                        "T1",
                        "cost",
                        0,
                        DocType::CostPdf,
                        "保証 原価",
                    )))
                    .collect(),
            )
            .await
            .unwrap();

        let filter = SearchFilter::new("T1", [DocType::CostPdf].into_iter().collect());
        let hits = index.similarity_search("保証", &filter, 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.doc_type, DocType::CostPdf);

        let all = SearchFilter::new("T1", DocType::all());
        assert_eq!(index.similarity_search("保証", &all, 2).await.unwrap().len(), 2);
        assert!(index.similarity_search("保証", &all, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_corpus_and_reindex_picks_up_new_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("corpus.jsonl");
        jsonl::append_line(&path, &chunk("T1", "a", 0, DocType::ManualMd, "first")).unwrap();
        jsonl::append_line(&path, &chunk("T2", "b", 0, DocType::ManualMd, "other tenant")).unwrap();

        let index = MemoryIndex::from_corpus(&path, embedder()).await.unwrap();
        assert_eq!(index.len().await, 2);

        jsonl::append_line(&path, &chunk("T1", "a", 1, DocType::ManualMd, "second")).unwrap();
        jsonl::append_line(&path, &chunk("T2", "b", 1, DocType::ManualMd, "not yet")).unwrap();

        let reindexed = index.reindex_tenant("T1").await.unwrap();
        assert_eq!(reindexed, 2);
        assert_eq!(index.len().await, 3);
        // Other tenants are left alone until they are reindexed
        let t2 = SearchFilter::new("T2", DocType::all());
        assert_eq!(index.similarity_search("not yet", &t2, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_corpus_is_empty() {
        let temp = TempDir::new().unwrap();
        let index = MemoryIndex::from_corpus(&temp.path().join("none.jsonl"), embedder())
            .await
            .unwrap();
        assert!(index.is_empty().await);
    }
}
