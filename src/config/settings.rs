//! Settings sections of the application config
//!
//! # Main Types
//!
//! - [`LoggingSettings`] - Log filter and optional log file
//! - [`LoadPolicy`] - How graph files with rejected edges are loaded

use serde::{Deserialize, Serialize};

pub use crate::graph::format::LoadPolicy;

/// Default tracing filter when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "info,homeflow=debug";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Also write a daily rolling log file into the app data directory
    #[serde(default)]
    pub log_to_file: bool,
}

fn default_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            log_to_file: false,
        }
    }
}
