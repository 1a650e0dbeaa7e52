//! If-Range module
//!
//! Decides whether a `Range` request may be answered with a partial body,
//! based on either an entity tag or a date.

use std::fmt;

use chrono::{DateTime, Utc};

use super::date::{format_http_date, parse_http_date};
use super::etag::{ETag, Strength};

/// Parsed `If-Range` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IfRange {
    /// No header: ranges are always allowed
    Unconditional,
    /// Strong entity tags only
    ByETag(ETag),
    ByDate(DateTime<Utc>),
}

impl IfRange {
    /// Parse a header value; never fails
    ///
    /// Values ending in ` GMT` are read as dates, anything else as a strong
    /// tag list. A date that does not parse never permits a range.
    ///
    /// # Examples
    /// ```
    /// use yarhs_conditional::http::if_range::IfRange;
    ///
    /// assert_eq!(IfRange::parse(""), IfRange::Unconditional);
    /// assert!(IfRange::parse("\"v1\"").permits(Some("v1"), None));
    /// assert!(!IfRange::parse("W/\"v1\"").permits(Some("v1"), None));
    /// ```
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::Unconditional;
        }
        if value.ends_with(" GMT") {
            return parse_http_date(value)
                .map_or_else(|| Self::ByETag(ETag::Set(Vec::new())), Self::ByDate);
        }
        Self::ByETag(ETag::parse(value, Strength::Strong))
    }

    pub fn from_header(value: Option<&str>) -> Self {
        value.map_or(Self::Unconditional, Self::parse)
    }

    /// Whether a response with this strong tag and modification date may be
    /// served partially
    pub fn permits(&self, etag_strong: Option<&str>, last_modified: Option<DateTime<Utc>>) -> bool {
        match self {
            Self::Unconditional | Self::ByETag(ETag::Any) => true,
            Self::ByETag(matcher) => etag_strong.is_some_and(|tag| matcher.contains(tag)),
            Self::ByDate(date) => last_modified.is_some_and(|lm| lm <= *date),
        }
    }
}

impl fmt::Display for IfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconditional => Ok(()),
            Self::ByETag(etag) => write!(f, "{etag}"),
            Self::ByDate(date) => f.write_str(&format_http_date(date)),
        }
    }
}
