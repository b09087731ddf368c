//! Reindex command handler.

use super::identity::IdentityArgs;
use crate::services::Services;
use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};

/// Re-embed the tenant's corpus (admins only)
#[derive(Args, Debug)]
pub struct ReindexCommand {
    #[command(flatten)]
    pub identity: IdentityArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReindexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing reindex command for tenant '{}'", self.identity.tenant_id);

        let identity = self.identity.to_identity();
        let services = Services::build(config).await?;
        let receipt = ragdesk_knowledge::reindex(&identity, services.index.as_ref()).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        } else {
            println!(
                "Reindexed {} chunks for tenant '{}' (task {})",
                receipt.chunks_reindexed, receipt.tenant_id, receipt.task_id
            );
        }

        Ok(())
    }
}
