//! Wiring of the query pipeline and its collaborators from configuration.

use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::{
    AuditSink, HashingProvider, JsonlAuditLog, MemoryIndex, NullAuditSink, QueryMetrics,
    RagPipeline,
};
use std::sync::Arc;

/// Long-lived collaborators shared by commands and HTTP handlers.
#[derive(Clone)]
pub struct Services {
    pub pipeline: Arc<RagPipeline>,
    pub index: Arc<MemoryIndex>,
    pub metrics: Arc<QueryMetrics>,
}

impl Services {
    /// Load the corpus into the in-memory index and build the pipeline.
    pub async fn build(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let embedder = Arc::new(HashingProvider::new(
            config.retrieval.embedding_dimensions,
        )?);
        let index = Arc::new(MemoryIndex::from_corpus(&config.corpus_path(), embedder).await?);

        let audit: Arc<dyn AuditSink> = if config.audit.enabled {
            Arc::new(JsonlAuditLog::new(config.audit_path()))
        } else {
            tracing::info!("Query audit log disabled");
            Arc::new(NullAuditSink)
        };
        let metrics = Arc::new(QueryMetrics::new());

        let pipeline = RagPipeline::from_config(config, index.clone(), audit, metrics.clone())?;

        Ok(Self {
            pipeline: Arc::new(pipeline),
            index,
            metrics,
        })
    }
}
