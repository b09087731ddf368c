//! Query orchestration.
//!
//! Sequences policy resolution, retrieval, generation, output masking,
//! confidence scoring, audit and metrics for one query.

use super::confidence;
use super::generate::AnswerGenerator;
use super::messages;
use super::retrieve::Retriever;
use super::sources;
use super::types::{AnswerStatus, RagResult, RetrievalOutcome};
use crate::audit::{AuditSink, QueryLogEntry};
use crate::masking::{apply_output_masking, MaskPolicyResolver};
use crate::metrics::MetricsSink;
use crate::tokens::TokenCounter;
use crate::types::Query;
use crate::vector_index::VectorIndex;
use chrono::Utc;
use ragdesk_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Per-pipeline knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub max_top_k: usize,
    pub audit_timeout: Duration,
    pub no_results_message: String,
}

/// The retrieval-augmented query pipeline. Stateless between queries;
/// share it behind an `Arc`.
pub struct RagPipeline {
    resolver: MaskPolicyResolver,
    retriever: Retriever,
    generator: AnswerGenerator,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<dyn MetricsSink>,
    settings: PipelineSettings,
}

impl RagPipeline {
    pub fn new(
        resolver: MaskPolicyResolver,
        retriever: Retriever,
        generator: AnswerGenerator,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<dyn MetricsSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            resolver,
            retriever,
            generator,
            audit,
            metrics,
            settings,
        }
    }

    /// Wire a pipeline from configuration around the given collaborators.
    pub fn from_config(
        config: &AppConfig,
        index: Arc<dyn VectorIndex>,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<dyn MetricsSink>,
    ) -> AppResult<Self> {
        let language = config.responses.language.as_str();

        let resolver = MaskPolicyResolver::from_config(&config.masking)?;
        let retriever = Retriever::new(
            index,
            Duration::from_secs(config.retrieval.timeout_secs),
        );

        let prompt = ragdesk_prompt::resolve_prompt(
            language,
            config.responses.prompt_file.as_deref(),
        )?;
        let apology = config
            .responses
            .apology_message
            .clone()
            .unwrap_or_else(|| messages::apology(language).to_string());
        let generator = AnswerGenerator::new(
            ragdesk_llm::create_router(&config.generation)?,
            prompt,
            TokenCounter::new()?,
            Duration::from_secs(config.generation.timeout_secs),
            apology,
        );

        let settings = PipelineSettings {
            top_k: config.retrieval.top_k,
            max_top_k: config.retrieval.max_top_k,
            audit_timeout: Duration::from_millis(config.audit.timeout_ms),
            no_results_message: config
                .responses
                .no_results_message
                .clone()
                .unwrap_or_else(|| messages::no_results(language).to_string()),
        };

        Ok(Self::new(resolver, retriever, generator, audit, metrics, settings))
    }

    /// Answer one query.
    ///
    /// Retrieval and generation failures degrade into a valid result. A
    /// tenant mismatch fails with [`AppError::AccessDenied`]; any other
    /// failure is recorded and returned as [`AppError::Pipeline`].
    pub async fn retrieve_and_generate(&self, query: &Query) -> AppResult<RagResult> {
        let query_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "rag_query",
            query_id = %query_id,
            tenant_id = %query.tenant_id
        );

        async {
            let started = Instant::now();
            match self.answer(query, &query_id, started).await {
                Ok(result) => Ok(result),
                Err(e) => {
                    tracing::error!("Query failed: {}", e);
                    self.metrics.record_error(&e.to_string());
                    Err(match e {
                        AppError::AccessDenied(_) | AppError::Pipeline(_) => e,
                        other => AppError::Pipeline(other.to_string()),
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn answer(&self, query: &Query, query_id: &str, started: Instant) -> AppResult<RagResult> {
        let identity = &query.identity;
        if identity.tenant_id != query.tenant_id {
            return Err(AppError::AccessDenied(format!(
                "user '{}' may not query tenant '{}'",
                identity.user_id, query.tenant_id
            )));
        }

        // Resolved per query so role changes apply immediately
        let policy = self.resolver.resolve(identity);
        let top_k = self.top_k(query.max_results);

        tracing::info!(
            role = %identity.role,
            top_k,
            masking = policy.masks_anything(),
            "Processing query"
        );

        let outcome = self
            .retriever
            .retrieve(
                &query.text,
                &query.tenant_id,
                query.filters.as_ref(),
                &policy,
                top_k,
            )
            .await;
        if let RetrievalOutcome::Failed(reason) = &outcome {
            tracing::warn!("Retrieval failed, answering without results: {}", reason);
        }

        let chunks = outcome.into_chunks();
        if chunks.is_empty() {
            let response_time_ms = elapsed_ms(started);
            tracing::info!(response_time_ms, "No results");
            return Ok(RagResult {
                answer: self.settings.no_results_message.clone(),
                confidence: 0.0,
                sources: Vec::new(),
                retrieved_docs: Vec::new(),
                response_time_ms,
                query_id: query_id.to_string(),
                status: AnswerStatus::NoResults,
            });
        }

        let generated = self.generator.generate(&query.text, &chunks).await?;
        let status = if generated.is_degraded() {
            AnswerStatus::GenerationFailed
        } else {
            AnswerStatus::Answered
        };

        let answer = apply_output_masking(generated.text(), &policy);
        // Scores come from retrieval, before any masking
        let confidence = confidence::estimate(&chunks);
        let sources = if query.include_sources {
            sources::summarize(&chunks, &policy)
        } else {
            Vec::new()
        };
        let retrieved_docs: Vec<String> = chunks.iter().map(|c| c.document_id.clone()).collect();
        let response_time_ms = elapsed_ms(started);

        let entry = QueryLogEntry {
            query_id: query_id.to_string(),
            tenant_id: query.tenant_id.clone(),
            user_id: Some(identity.user_id.clone()),
            query_text: query.text.clone(),
            answer_text: answer.clone(),
            retrieved_document_ids: retrieved_docs.clone(),
            confidence,
            response_time_ms,
            timestamp: Utc::now(),
        };
        self.write_audit(&entry).await;
        self.metrics.record(response_time_ms, confidence, chunks.len());

        tracing::info!(
            status = ?status,
            confidence,
            chunks = chunks.len(),
            response_time_ms,
            "Query answered"
        );

        Ok(RagResult {
            answer,
            confidence,
            sources,
            retrieved_docs,
            response_time_ms,
            query_id: query_id.to_string(),
            status,
        })
    }

    /// Requested result count, bounded to `1..=max_top_k`.
    fn top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.settings.top_k)
            .clamp(1, self.settings.max_top_k.max(1))
    }

    async fn write_audit(&self, entry: &QueryLogEntry) {
        let timeout = self.settings.audit_timeout;
        match tokio::time::timeout(timeout, self.audit.append(entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Audit write failed: {}", e);
                self.metrics.record_error(&format!("audit write failed: {}", e));
            }
            Err(_) => {
                tracing::warn!("Audit write timed out after {:?}", timeout);
                self.metrics
                    .record_error(&format!("audit write timed out after {:?}", timeout));
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
