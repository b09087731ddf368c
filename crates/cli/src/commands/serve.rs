//! Serve command handler.

use crate::server;
use crate::services::Services;
use clap::Args;
use ragdesk_core::{config::AppConfig, AppError, AppResult};

/// Run the HTTP API
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (overrides server.bind)
    #[arg(long)]
    pub bind: Option<String>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let bind = self.bind.as_deref().unwrap_or(&config.server.bind);
        tracing::info!("Executing serve command on {}", bind);

        let services = Services::build(config).await?;
        server::run_server(bind, &config.server.cors_origins, services)
            .await
            .map_err(|e| AppError::Other(format!("Server error: {}", e)))
    }
}
