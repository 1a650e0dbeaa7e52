//! Decision log format module
//!
//! Supports multiple log formats:
//! - `text` (one human readable line)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::Local;
use serde::Serialize;

/// One conditional decision: what was asked and what was answered
#[derive(Debug, Clone, Serialize)]
pub struct DecisionLogEntry {
    /// Decision timestamp
    #[serde(serialize_with = "serialize_time")]
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, HEAD, ...)
    pub method: String,
    /// Final response status code
    pub status: u16,
    /// Outcome name (pass, not_modified, partial, ...)
    pub outcome: String,
    /// `Range` header as understood
    pub range: Option<String>,
    /// `Content-Range` sent back
    pub content_range: Option<String>,
    /// Response entity tag
    pub etag: Option<String>,
    /// `If-None-Match` header as understood
    pub if_none_match: Option<String>,
    /// `If-Range` header as understood
    pub if_range: Option<String>,
}

fn serialize_time<S: serde::Serializer>(
    time: &chrono::DateTime<Local>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339())
}

impl DecisionLogEntry {
    /// Create a new entry with current timestamp
    pub fn new(method: String, status: u16, outcome: String) -> Self {
        Self {
            time: Local::now(),
            method,
            status,
            outcome,
            range: None,
            content_range: None,
            etag: None,
            if_none_match: None,
            if_range: None,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "text" => self.format_text(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    /// `[time] [Conditional] METHOD STATUS outcome key=value...`
    fn format_text(&self) -> String {
        let mut line = format!(
            "[{}] [Conditional] {} {} {}",
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.status,
            self.outcome,
        );
        for (key, value) in [
            ("range", &self.range),
            ("content-range", &self.content_range),
            ("etag", &self.etag),
            ("if-none-match", &self.if_none_match),
            ("if-range", &self.if_range),
        ] {
            if let Some(value) = value {
                line.push_str(&format!(" {key}={value:?}"));
            }
        }
        line
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"error":"failed to serialize decision: {e}"}}"#)
        })
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$method` - HTTP method
    /// - `$status` - Final status code
    /// - `$outcome` - Outcome name
    /// - `$range`, `$content_range`, `$etag`, `$if_none_match`, `$if_range`
    ///   (`-` when absent)
    fn format_custom(&self, pattern: &str) -> String {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

        // $content_range must be replaced before $range
        pattern
            .replace("$time_local", &self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string())
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$method", &self.method)
            .replace("$status", &self.status.to_string())
            .replace("$outcome", &self.outcome)
            .replace("$content_range", &or_dash(&self.content_range))
            .replace("$range", &or_dash(&self.range))
            .replace("$etag", &or_dash(&self.etag))
            .replace("$if_none_match", &or_dash(&self.if_none_match))
            .replace("$if_range", &or_dash(&self.if_range))
    }
}
