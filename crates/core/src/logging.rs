//! Tracing setup.
//!
//! Everything goes to stderr; stdout carries answers and JSON output only.
//! `serve` deployments usually want [`LogFormat::Json`] so a log shipper can
//! pick up the `query_id` and `tenant_id` fields of each query span.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{AppError, AppResult};

/// Output format of the stderr log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event, with span fields flattened in
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!(
                "Unknown log format: '{}'. Expected 'text' or 'json'",
                other
            ))),
        }
    }
}

/// Install the global subscriber.
///
/// `log_level` is an `EnvFilter` directive such as `"debug"` or
/// `"info,ragdesk_knowledge=trace"`; without one, `RUST_LOG` or `info` applies.
/// Fails if a subscriber is already installed.
///
/// ```no_run
/// use ragdesk_core::logging::{init_logging, LogFormat};
///
/// init_logging(Some("info"), false, LogFormat::Text).expect("logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool, format: LogFormat) -> AppResult<()> {
    let directive = match log_level {
        Some(level) => level.to_string(),
        None => std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
    };
    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", directive, e)))?;

    let fmt_layer = match format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(!no_color && std::env::var_os("NO_COLOR").is_none())
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}
