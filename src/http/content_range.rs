//! Content-Range module
//!
//! Response-side `Content-Range` values: `bytes A-B/L`, `bytes */L`, with
//! `*` for an unknown length.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// `Content-Range` value, stop exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    start: Option<u64>,
    stop: Option<u64>,
    length: Option<u64>,
}

/// Shared start/stop/length consistency check
///
/// With `response` set, a range that runs past a known length is invalid:
/// `bytes 0-50/10` is a broken response, while a request for `bytes=0-50`
/// against 10 bytes is fine.
pub(crate) const fn is_content_range_valid(
    start: Option<u64>,
    stop: Option<u64>,
    length: Option<u64>,
    response: bool,
) -> bool {
    match (start, stop, length) {
        (None, None, _) => true,
        (Some(start), Some(stop), None) => start < stop,
        (Some(start), Some(stop), Some(length)) => {
            if start >= stop || (response && stop > length) {
                return false;
            }
            start < length
        }
        _ => false,
    }
}

fn content_range_regex() -> &'static Regex {
    static CONTENT_RANGE_RE: OnceLock<Regex> = OnceLock::new();
    CONTENT_RANGE_RE.get_or_init(|| {
        Regex::new(r"^\s*bytes\s+(?:(\d+)-(\d+)|\*)/(?:(\d+)|\*)\s*$")
            .expect("content range pattern is valid")
    })
}

impl ContentRange {
    /// Build a content range, rejecting inconsistent values
    pub fn new(start: Option<u64>, stop: Option<u64>, length: Option<u64>) -> Result<Self> {
        if !is_content_range_valid(start, stop, length, false) {
            return Err(Error::InvalidContentRange {
                start,
                stop,
                length,
            });
        }
        Ok(Self {
            start,
            stop,
            length,
        })
    }

    /// `bytes */length`, sent with a 416
    pub const fn unsatisfied(length: u64) -> Self {
        Self {
            start: None,
            stop: None,
            length: Some(length),
        }
    }

    /// Parse a `Content-Range` header value
    ///
    /// # Examples
    /// ```
    /// use yarhs_conditional::http::content_range::ContentRange;
    ///
    /// let range = ContentRange::parse("bytes 0-499/1000").unwrap();
    /// assert_eq!(range.start(), Some(0));
    /// assert_eq!(range.stop(), Some(500));
    /// assert_eq!(range.length(), Some(1000));
    ///
    /// // Claims more bytes than the resource has
    /// assert!(ContentRange::parse("bytes 0-50/10").is_none());
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let caps = content_range_regex().captures(value)?;
        let start = caps.get(1).map(|m| m.as_str().parse::<u64>()).transpose().ok()?;
        let stop = match caps.get(2) {
            Some(m) => Some(m.as_str().parse::<u64>().ok()?.checked_add(1)?),
            None => None,
        };
        let length = caps.get(3).map(|m| m.as_str().parse::<u64>()).transpose().ok()?;

        if !is_content_range_valid(start, stop, length, true) {
            return None;
        }
        Self::new(start, stop, length).ok()
    }

    pub const fn start(&self) -> Option<u64> {
        self.start
    }

    pub const fn stop(&self) -> Option<u64> {
        self.stop
    }

    pub const fn length(&self) -> Option<u64> {
        self.length
    }

    /// Number of bytes covered, `None` for `bytes */L`
    pub fn len(&self) -> Option<u64> {
        Some(self.stop? - self.start?)
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bytes ")?;
        match (self.start, self.stop) {
            (Some(start), Some(stop)) => write!(f, "{start}-{}", stop - 1)?,
            _ => f.write_str("*")?,
        }
        match self.length {
            Some(length) => write!(f, "/{length}"),
            None => f.write_str("/*"),
        }
    }
}
