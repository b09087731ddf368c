//! Ask command handler.
//!
//! Runs one question through the query pipeline on behalf of a caller.

use super::identity::IdentityArgs;
use crate::services::Services;
use chrono::NaiveDate;
use clap::Args;
use ragdesk_core::{config::AppConfig, AppError, AppResult};
use ragdesk_knowledge::{DateRange, DocType, Query, QueryFilter, RagResult};
use std::path::PathBuf;

/// Ask a question against the tenant's documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "query")]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Restrict to document types (repeatable), e.g. estimate_pdf
    #[arg(long = "doc-type")]
    pub doc_types: Vec<DocType>,

    /// Restrict to stores (repeatable)
    #[arg(long = "store-id")]
    pub store_ids: Vec<String>,

    /// Restrict to projects (repeatable)
    #[arg(long = "project-id")]
    pub project_ids: Vec<String>,

    /// Earliest document date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest document date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub max_results: Option<usize>,

    /// Omit source summaries
    #[arg(long)]
    pub no_sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let text = self.get_query()?;
        let query = self.build_query(text);

        let services = Services::build(config).await?;
        let result = services.pipeline.retrieve_and_generate(&query).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        } else {
            print_result(&result);
        }

        Ok(())
    }

    fn get_query(&self) -> AppResult<String> {
        let text = match (&self.query, &self.file) {
            (Some(query), _) => query.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => {
                return Err(AppError::Config("No question provided".to_string()));
            }
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::Config("Question must not be empty".to_string()));
        }
        Ok(text)
    }

    fn build_query(&self, text: String) -> Query {
        let mut query = Query::new(text, self.identity.to_identity());

        if let Some(filters) = self.filters() {
            query = query.with_filters(filters);
        }
        if let Some(max_results) = self.max_results {
            query = query.with_max_results(max_results);
        }
        if self.no_sources {
            query = query.without_sources();
        }
        query
    }

    fn filters(&self) -> Option<QueryFilter> {
        let mut filters = QueryFilter::default();
        if !self.doc_types.is_empty() {
            filters = filters.with_doc_types(self.doc_types.clone());
        }
        if !self.store_ids.is_empty() {
            filters = filters.with_store_ids(self.store_ids.clone());
        }
        if !self.project_ids.is_empty() {
            filters = filters.with_project_ids(self.project_ids.clone());
        }
        if self.from.is_some() || self.to.is_some() {
            filters = filters.with_date_range(DateRange {
                start: self.from,
                end: self.to,
            });
        }

        (filters != QueryFilter::default()).then_some(filters)
    }
}

fn print_result(result: &RagResult) {
    println!("{}", result.answer);

    if !result.sources.is_empty() {
        println!();
        for (i, source) in result.sources.iter().enumerate() {
            let page = source
                .page_number
                .map(|p| format!(" p.{}", p))
                .unwrap_or_default();
            println!(
                "[{}] {}{} (score {:.2})",
                i + 1,
                source.metadata.file_name,
                page,
                source.confidence_score
            );
        }
    }

    tracing::debug!(
        "Query {} - status: {:?}, confidence: {:.2}, {} ms",
        result.query_id,
        result.status,
        result.confidence,
        result.response_time_ms
    );
}
