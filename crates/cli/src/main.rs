//! ragdesk CLI
//!
//! Main entry point for the ragdesk command-line tool.
//! Answers questions over a tenant's business documents and serves the
//! same pipeline over HTTP.

mod commands;
mod server;
mod services;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ReindexCommand, ServeCommand, StatsCommand};
use ragdesk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// ragdesk - grounded answers over tenant business documents
#[derive(Parser, Debug)]
#[command(name = "ragdesk")]
#[command(about = "Grounded answers over tenant business documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "RAGDESK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "RAGDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Answer language (ja, en)
    #[arg(short, long, global = true, env = "RAGDESK_LANGUAGE")]
    language: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question against the tenant's documents
    Ask(AskCommand),

    /// Re-embed the tenant's corpus (admins only)
    Reindex(ReindexCommand),

    /// Show query statistics from the audit log
    Stats(StatsCommand),

    /// Run the HTTP API
    Serve(ServeCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from file and environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.language,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    )?;

    // Initialize logging with final configuration
    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        config.log_format,
    )?;

    tracing::info!("ragdesk starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Language: {}", config.responses.language);

    // Ensure .ragdesk directory exists
    config.ensure_ragdesk_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Reindex(_) => "reindex",
        Commands::Stats(_) => "stats",
        Commands::Serve(_) => "serve",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Reindex(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
