//! Domain types shared across retrieval, masking and answering.

use chrono::NaiveDate;
use ragdesk_core::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Kind of uploaded business document a chunk was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    EstimatePdf,
    CostPdf,
    ContractPdf,
    InventoryCsv,
    ManualMd,
}

impl DocType {
    pub const ALL: [DocType; 5] = [
        DocType::EstimatePdf,
        DocType::CostPdf,
        DocType::ContractPdf,
        DocType::InventoryCsv,
        DocType::ManualMd,
    ];

    /// Every document type.
    pub fn all() -> BTreeSet<DocType> {
        Self::ALL.into_iter().collect()
    }

    /// Wire name, as used in filters, permissions and corpus records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::EstimatePdf => "estimate_pdf",
            DocType::CostPdf => "cost_pdf",
            DocType::ContractPdf => "contract_pdf",
            DocType::InventoryCsv => "inventory_csv",
            DocType::ManualMd => "manual_md",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::Knowledge(format!("Unknown document type: '{}'", s)))
    }
}

/// An already-authenticated caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserIdentity {
    pub fn new(
        user_id: impl Into<String>,
        tenant_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            store_id: None,
            role: role.into(),
            permissions: Vec::new(),
            is_admin: false,
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// Inclusive calendar date range. Open on a side when that bound is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Caller-supplied retrieval restrictions. Every set field narrows the search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_types: Option<Vec<DocType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl QueryFilter {
    pub fn with_doc_types(mut self, doc_types: Vec<DocType>) -> Self {
        self.doc_types = Some(doc_types);
        self
    }

    pub fn with_store_ids(mut self, store_ids: Vec<String>) -> Self {
        self.store_ids = Some(store_ids);
        self
    }

    pub fn with_project_ids(mut self, project_ids: Vec<String>) -> Self {
        self.project_ids = Some(project_ids);
        self
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }
}

/// One question asked by one caller.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub tenant_id: String,
    pub filters: Option<QueryFilter>,
    pub identity: UserIdentity,
    /// Overrides the configured top-k, capped by `retrieval.max_top_k`
    pub max_results: Option<usize>,
    pub include_sources: bool,
}

impl Query {
    /// Query scoped to the caller's own tenant.
    pub fn new(text: impl Into<String>, identity: UserIdentity) -> Self {
        Self {
            text: text.into(),
            tenant_id: identity.tenant_id.clone(),
            filters: None,
            identity,
            max_results: None,
            include_sources: true,
        }
    }

    pub fn for_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn with_filters(mut self, filters: QueryFilter) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn without_sources(mut self) -> Self {
        self.include_sources = false;
        self
    }
}

/// Metadata stored alongside every indexed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub tenant_id: String,
    pub document_id: String,
    pub file_name: String,
    pub doc_type: DocType,
    pub chunk_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_date: Option<NaiveDate>,
}

/// A corpus record: chunk text plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}
