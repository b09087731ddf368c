//! Stats command handler.
//!
//! Summarizes the query audit log.

use chrono::{DateTime, Duration, Utc};
use clap::{Args, ValueEnum};
use ragdesk_core::{config::AppConfig, AppResult};
use ragdesk_knowledge::{JsonlAuditLog, QueryLogEntry};
use serde::Serialize;
use std::collections::HashMap;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Week,
    Month,
    All,
}

impl Period {
    fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Today => Some(now - Duration::days(1)),
            Period::Week => Some(now - Duration::weeks(1)),
            Period::Month => Some(now - Duration::days(30)),
            Period::All => None,
        }
    }
}

/// Show query statistics from the audit log
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Only count queries for this tenant
    #[arg(long)]
    pub tenant: Option<String>,

    /// Time period to include
    #[arg(long, value_enum, default_value = "all")]
    pub period: Period,

    /// Number of most-cited documents to list
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub queries: usize,
    pub avg_confidence: f64,
    pub avg_response_time_ms: f64,
    pub max_response_time_ms: u64,
    pub top_documents: Vec<(String, usize)>,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");
        tracing::debug!("Stats options: {:?}", self);

        let log = JsonlAuditLog::new(config.audit_path());
        let entries = log.entries()?;
        let since = self.period.since(Utc::now());

        let selected: Vec<&QueryLogEntry> = entries
            .iter()
            .filter(|e| self.tenant.as_ref().map_or(true, |t| &e.tenant_id == t))
            .filter(|e| since.map_or(true, |s| e.timestamp >= s))
            .collect();
        let summary = summarize(&selected, self.top);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("Queries:           {}", summary.queries);
        println!("Avg confidence:    {:.2}", summary.avg_confidence);
        println!("Avg response time: {:.0} ms", summary.avg_response_time_ms);
        println!("Max response time: {} ms", summary.max_response_time_ms);
        if !summary.top_documents.is_empty() {
            println!("Most cited documents:");
            for (document_id, count) in &summary.top_documents {
                println!("  {:>4}  {}", count, document_id);
            }
        }

        Ok(())
    }
}

/// Aggregate audit entries. Documents are counted once per query.
///
/// Only queries that retrieved something are audited, so every entry here
/// was answered from at least one chunk.
pub fn summarize(entries: &[&QueryLogEntry], top: usize) -> AuditSummary {
    if entries.is_empty() {
        return AuditSummary::default();
    }

    let mut citations: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        let mut seen: Vec<&str> = entry
            .retrieved_document_ids
            .iter()
            .map(String::as_str)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        for doc in seen {
            *citations.entry(doc).or_insert(0) += 1;
        }
    }

    let mut top_documents: Vec<(String, usize)> = citations
        .into_iter()
        .map(|(doc, count)| (doc.to_string(), count))
        .collect();
    top_documents.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_documents.truncate(top);

    let count = entries.len() as f64;
    AuditSummary {
        queries: entries.len(),
        avg_confidence: entries.iter().map(|e| f64::from(e.confidence)).sum::<f64>() / count,
        avg_response_time_ms: entries.iter().map(|e| e.response_time_ms as f64).sum::<f64>()
            / count,
        max_response_time_ms: entries.iter().map(|e| e.response_time_ms).max().unwrap_or(0),
        top_documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tenant: &str, docs: &[&str], confidence: f32, ms: u64) -> QueryLogEntry {
        QueryLogEntry {
            query_id: "q".to_string(),
            tenant_id: tenant.to_string(),
            user_id: None,
            query_text: "質問".to_string(),
            answer_text: "回答".to_string(),
            retrieved_document_ids: docs.iter().map(|d| d.to_string()).collect(),
            confidence,
            response_time_ms: ms,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_log() {
        assert_eq!(summarize(&[], 5), AuditSummary::default());
    }

    #[test]
    fn test_summary_counts_documents_once_per_query() {
        let a = entry("T1", &["warranty", "warranty", "manual"], 0.5, 100);
        let b = entry("T1", &["warranty"], 1.0, 300);
        let summary = summarize(&[&a, &b], 5);

        assert_eq!(summary.queries, 2);
        assert!((summary.avg_confidence - 0.75).abs() < 1e-9);
        assert_eq!(summary.avg_response_time_ms, 200.0);
        assert_eq!(summary.max_response_time_ms, 300);
        assert_eq!(
            summary.top_documents,
            vec![("warranty".to_string(), 2), ("manual".to_string(), 1)]
        );
    }

    #[test]
    fn test_summary_json_fields() {
        let a = entry("T1", &["manual"], 0.6, 80);
        let json = serde_json::to_value(summarize(&[&a], 5)).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 5, "{:?}", keys);
        assert!(json.get("answered").is_none());
        assert_eq!(json["queries"], 1);
    }

    #[test]
    fn test_period_bounds() {
        let now = Utc::now();
        assert_eq!(Period::All.since(now), None);
        assert_eq!(Period::Week.since(now), Some(now - Duration::weeks(1)));
    }
}
