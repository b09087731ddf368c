//! Query metrics.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Receives per-query measurements and error notifications.
pub trait MetricsSink: Send + Sync {
    fn record(&self, latency_ms: u64, confidence: f32, chunk_count: usize);

    fn record_error(&self, message: &str);
}

/// Point-in-time view of [`QueryMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub queries: u64,
    pub errors: u64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
    pub avg_confidence: f64,
    pub avg_chunks: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct Totals {
    queries: u64,
    errors: u64,
    latency_ms: u64,
    max_latency_ms: u64,
    confidence: f64,
    chunks: u64,
    last_error: Option<String>,
}

/// In-process aggregates, also emitted as tracing events under
/// `ragdesk::metrics`.
#[derive(Debug, Default)]
pub struct QueryMetrics {
    totals: Mutex<Totals>,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        let per_query = |sum: f64| {
            if totals.queries == 0 {
                0.0
            } else {
                sum / totals.queries as f64
            }
        };

        MetricsSnapshot {
            queries: totals.queries,
            errors: totals.errors,
            avg_latency_ms: per_query(totals.latency_ms as f64),
            max_latency_ms: totals.max_latency_ms,
            avg_confidence: per_query(totals.confidence),
            avg_chunks: per_query(totals.chunks as f64),
            last_error: totals.last_error.clone(),
        }
    }
}

impl MetricsSink for QueryMetrics {
    fn record(&self, latency_ms: u64, confidence: f32, chunk_count: usize) {
        {
            let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
            totals.queries += 1;
            totals.latency_ms += latency_ms;
            totals.max_latency_ms = totals.max_latency_ms.max(latency_ms);
            totals.confidence += f64::from(confidence);
            totals.chunks += chunk_count as u64;
        }

        tracing::info!(
            target: "ragdesk::metrics",
            latency_ms,
            confidence,
            chunk_count,
            "query recorded"
        );
    }

    fn record_error(&self, message: &str) {
        {
            let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
            totals.errors += 1;
            totals.last_error = Some(message.to_string());
        }

        tracing::warn!(target: "ragdesk::metrics", error = %message, "query error recorded");
    }
}
