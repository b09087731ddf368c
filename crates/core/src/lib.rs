//! Shared foundations of the ragdesk crates: the `AppError` type, tracing
//! setup and layered YAML/env/CLI configuration.

pub mod config;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::LogFormat;
