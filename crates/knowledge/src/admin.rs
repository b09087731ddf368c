//! Administrative operations on the index.

use crate::types::UserIdentity;
use crate::vector_index::VectorIndex;
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Result of a completed reindex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexReceipt {
    pub task_id: String,
    pub tenant_id: String,
    pub chunks_reindexed: usize,
}

/// Re-embed every chunk of the caller's tenant. Admins only; the caller's
/// tenant is the only one touched.
pub async fn reindex(identity: &UserIdentity, index: &dyn VectorIndex) -> AppResult<ReindexReceipt> {
    if !identity.is_admin {
        tracing::warn!(
            user = %identity.user_id,
            tenant = %identity.tenant_id,
            "Rejected reindex request from non-admin"
        );
        return Err(AppError::AccessDenied(
            "admin access required to reindex".to_string(),
        ));
    }

    let task_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(task_id = %task_id, tenant = %identity.tenant_id, "Starting reindex");

    let chunks_reindexed = index.reindex_tenant(&identity.tenant_id).await?;

    tracing::info!(
        task_id = %task_id,
        tenant = %identity.tenant_id,
        chunks = chunks_reindexed,
        "Reindex complete"
    );

    Ok(ReindexReceipt {
        task_id,
        tenant_id: identity.tenant_id.clone(),
        chunks_reindexed,
    })
}
