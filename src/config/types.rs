// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub conditional: ConditionalConfig,
    #[serde(default)]
    pub gzip: GzipConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Conditional response configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConditionalConfig {
    /// Answer failed `If-Match` / `If-Unmodified-Since` with 412
    #[serde(default)]
    pub enforce_preconditions: bool,
    /// Methods the conditional logic applies to; others pass through
    #[serde(default = "default_safe_methods")]
    pub safe_methods: Vec<String>,
}

fn default_safe_methods() -> Vec<String> {
    vec!["GET".to_string(), "HEAD".to_string()]
}

impl Default for ConditionalConfig {
    fn default() -> Self {
        Self {
            enforce_preconditions: false,
            safe_methods: default_safe_methods(),
        }
    }
}

/// Gzip encoding configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GzipConfig {
    /// Compression level, 0-9 (higher values are clamped)
    #[serde(default = "default_gzip_level")]
    pub level: u32,
    /// Bodies with a known length below this are sent as-is
    #[serde(default)]
    pub min_length: u64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_gzip_level() -> u32 {
    9
}

impl Default for GzipConfig {
    fn default() -> Self {
        Self {
            level: default_gzip_level(),
            min_length: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit one entry per conditional decision
    #[serde(default)]
    pub decision_log: bool,
    /// Decision log format (text, json, or custom pattern)
    #[serde(default = "default_decision_log_format")]
    pub decision_log_format: String,
    /// Log file path (optional, stdout if not set)
    #[serde(default)]
    pub log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_decision_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            decision_log: false,
            decision_log_format: default_decision_log_format(),
            log_file: None,
            error_log_file: None,
        }
    }
}
