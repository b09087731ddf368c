//! Query audit log.

use crate::jsonl;
use chrono::{DateTime, Utc};
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One answered query, as persisted for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query_id: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub query_text: String,
    /// Answer after masking
    pub answer_text: String,
    pub retrieved_document_ids: Vec<String>,
    pub confidence: f32,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Destination for audit entries. Callers treat failures as non-fatal.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: &QueryLogEntry) -> AppResult<()>;
}

/// Appends entries to a JSONL file.
#[derive(Debug, Clone)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry written so far, oldest first.
    pub fn entries(&self) -> AppResult<Vec<QueryLogEntry>> {
        jsonl::read_lines(&self.path)
    }
}

#[async_trait::async_trait]
impl AuditSink for JsonlAuditLog {
    async fn append(&self, entry: &QueryLogEntry) -> AppResult<()> {
        let path = self.path.clone();
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || jsonl::append_line(&path, &entry))
            .await
            .map_err(|e| AppError::Knowledge(format!("Audit write task failed: {}", e)))??;

        tracing::debug!("Appended audit entry to {:?}", self.path);
        Ok(())
    }
}

/// Discards entries. Used when auditing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

#[async_trait::async_trait]
impl AuditSink for NullAuditSink {
    async fn append(&self, _entry: &QueryLogEntry) -> AppResult<()> {
        Ok(())
    }
}
