//! Command handlers for the ragdesk CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod identity;
pub mod reindex;
pub mod serve;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use reindex::ReindexCommand;
pub use serve::ServeCommand;
pub use stats::StatsCommand;
