//! Test doubles for pipeline scenarios.

use crate::audit::{AuditSink, QueryLogEntry};
use crate::masking::MaskPolicyResolver;
use crate::metrics::MetricsSink;
use crate::rag::{messages, AnswerGenerator, PipelineSettings, RagPipeline, Retriever};
use crate::tokens::TokenCounter;
use crate::types::{ChunkMetadata, DocType, UserIdentity};
use crate::vector_index::{SearchFilter, SearchHit, VectorIndex};
use ragdesk_core::{AppError, AppResult};
use ragdesk_llm::{
    LlmClient, LlmRequest, LlmResponse, LlmUsage, ModelRouter, RoutedModel, StopReason,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn hit(tenant: &str, doc: &str, index: u32, doc_type: DocType, text: &str, score: f32) -> SearchHit {
    SearchHit {
        text: text.to_string(),
        metadata: ChunkMetadata {
            tenant_id: tenant.to_string(),
            document_id: doc.to_string(),
            file_name: format!("{}.pdf", doc),
            doc_type,
            chunk_index: index,
            page_number: Some(index + 1),
            store_id: None,
            project_id: None,
            document_date: None,
        },
        score,
    }
}

pub fn manager(tenant: &str) -> UserIdentity {
    UserIdentity::new("u-manager", tenant, "manager")
}

/// Serves canned hits. Honours the filter unless built with `leaky`.
pub struct StubIndex {
    hits: Vec<SearchHit>,
    honor_filter: bool,
    searches: Mutex<Vec<(SearchFilter, usize)>>,
    reindexed: Mutex<Vec<String>>,
}

impl StubIndex {
    pub fn new(hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self {
            hits,
            honor_filter: true,
            searches: Mutex::new(Vec::new()),
            reindexed: Mutex::new(Vec::new()),
        })
    }

    /// Ignores the filter, as a misbehaving backend would.
    pub fn leaky(hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self {
            hits,
            honor_filter: false,
            searches: Mutex::new(Vec::new()),
            reindexed: Mutex::new(Vec::new()),
        })
    }

    pub fn searches(&self) -> Vec<(SearchFilter, usize)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn reindexed(&self) -> Vec<String> {
        self.reindexed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl VectorIndex for StubIndex {
    async fn similarity_search(
        &self,
        _query_text: &str,
        filter: &SearchFilter,
        top_k: usize,
    ) -> AppResult<Vec<SearchHit>> {
        self.searches.lock().unwrap().push((filter.clone(), top_k));
        Ok(self
            .hits
            .iter()
            .filter(|h| !self.honor_filter || filter.matches(&h.metadata))
            .cloned()
            .collect())
    }

    async fn reindex_tenant(&self, tenant_id: &str) -> AppResult<usize> {
        self.reindexed.lock().unwrap().push(tenant_id.to_string());
        Ok(self
            .hits
            .iter()
            .filter(|h| h.metadata.tenant_id == tenant_id)
            .count())
    }
}

pub struct FailingIndex;

#[async_trait::async_trait]
impl VectorIndex for FailingIndex {
    async fn similarity_search(
        &self,
        _query_text: &str,
        _filter: &SearchFilter,
        _top_k: usize,
    ) -> AppResult<Vec<SearchHit>> {
        Err(AppError::Knowledge("vector store unreachable".to_string()))
    }

    async fn reindex_tenant(&self, _tenant_id: &str) -> AppResult<usize> {
        Err(AppError::Knowledge("vector store unreachable".to_string()))
    }
}

/// Model double returning a fixed answer or error.
pub struct ScriptedLlm {
    answer: Result<String, String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.answer {
            Ok(text) => Ok(LlmResponse {
                content: text.clone(),
                model: request.model.clone(),
                stop_reason: StopReason::Complete,
                usage: LlmUsage::new(100, 20),
            }),
            Err(message) => Err(AppError::Llm(message.clone())),
        }
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    entries: Mutex<Vec<QueryLogEntry>>,
}

impl RecordingAudit {
    pub fn entries(&self) -> Vec<QueryLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AuditSink for RecordingAudit {
    async fn append(&self, entry: &QueryLogEntry) -> AppResult<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

pub struct FailingAudit;

#[async_trait::async_trait]
impl AuditSink for FailingAudit {
    async fn append(&self, _entry: &QueryLogEntry) -> AppResult<()> {
        Err(AppError::Knowledge("disk full".to_string()))
    }
}

pub struct HangingAudit;

#[async_trait::async_trait]
impl AuditSink for HangingAudit {
    async fn append(&self, _entry: &QueryLogEntry) -> AppResult<()> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMetrics {
    records: Mutex<Vec<(u64, f32, usize)>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingMetrics {
    pub fn records(&self) -> Vec<(u64, f32, usize)> {
        self.records.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, latency_ms: u64, confidence: f32, chunk_count: usize) {
        self.records
            .lock()
            .unwrap()
            .push((latency_ms, confidence, chunk_count));
    }

    fn record_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Collaborators for one pipeline under test.
pub struct Harness {
    pub default_llm: Arc<ScriptedLlm>,
    pub extended_llm: Arc<ScriptedLlm>,
    pub audit_log: Arc<RecordingAudit>,
    pub audit: Arc<dyn AuditSink>,
    pub metrics: Arc<RecordingMetrics>,
    pub threshold_tokens: usize,
}

impl Harness {
    pub fn new(answer: &str) -> Self {
        let audit_log = Arc::new(RecordingAudit::default());
        Self {
            default_llm: ScriptedLlm::answering(answer),
            extended_llm: ScriptedLlm::answering(answer),
            audit: audit_log.clone(),
            audit_log,
            metrics: Arc::new(RecordingMetrics::default()),
            threshold_tokens: 3000,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_default_llm(mut self, llm: Arc<ScriptedLlm>) -> Self {
        self.default_llm = llm;
        self
    }

    pub fn with_threshold(mut self, threshold_tokens: usize) -> Self {
        self.threshold_tokens = threshold_tokens;
        self
    }

    pub fn pipeline(&self, index: Arc<dyn VectorIndex>) -> RagPipeline {
        let router = ModelRouter::new(
            RoutedModel::new(self.default_llm.clone(), "gpt-4", 0.1, 1000),
            RoutedModel::new(self.extended_llm.clone(), "claude-3-haiku-20240307", 0.1, 2000),
            self.threshold_tokens,
        );
        let generator = AnswerGenerator::new(
            router,
            ragdesk_prompt::builtin_prompt("ja").unwrap(),
            TokenCounter::new().unwrap(),
            Duration::from_secs(2),
            messages::apology("ja"),
        );

        RagPipeline::new(
            MaskPolicyResolver::default(),
            Retriever::new(index, Duration::from_secs(2)),
            generator,
            self.audit.clone(),
            self.metrics.clone(),
            PipelineSettings {
                top_k: 5,
                max_top_k: 20,
                audit_timeout: Duration::from_millis(100),
                no_results_message: messages::no_results("ja").to_string(),
            },
        )
    }
}
