//! HTTP Range request parsing module
//!
//! Single `bytes` range parsing and resolution against a resource length.
//! Multi-range requests are treated as "no range".

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::content_range::ContentRange;

/// Parsed `Range` request header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte, negative for a suffix range (`bytes=-N`), `None` when the
    /// range can never be satisfied (`bytes=-0`)
    pub start: Option<i64>,
    /// End position (exclusive), `None` means until end of resource
    pub end: Option<i64>,
}

fn range_regex() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*bytes\s*=\s*(\d*)\s*-\s*(\d*)\s*$").expect("range pattern is valid")
    })
}

impl ByteRange {
    /// Parse a `Range` header value (single range, bytes unit)
    ///
    /// Supported formats:
    /// - `bytes=start-end` - Specific range
    /// - `bytes=start-` - From start to end
    /// - `bytes=-suffix` - Last suffix bytes
    ///
    /// Anything else yields `None`.
    ///
    /// # Examples
    /// ```
    /// use yarhs_conditional::http::range::ByteRange;
    ///
    /// let range = ByteRange::parse("bytes=0-499").unwrap();
    /// assert_eq!(range.range_for_length(Some(1000)), Some((0, 500)));
    ///
    /// // Multi-range is not supported
    /// assert!(ByteRange::parse("bytes=0-9,20-29").is_none());
    /// ```
    pub fn parse(header: &str) -> Option<Self> {
        let caps = range_regex().captures(header)?;
        let (start_str, end_str) = (caps.get(1)?.as_str(), caps.get(2)?.as_str());

        // Suffix range: "-500" means last 500 bytes
        if start_str.is_empty() {
            return parse_suffix_range(end_str);
        }

        let start = start_str.parse::<i64>().ok()?;
        if end_str.is_empty() {
            return Some(Self {
                start: Some(start),
                end: None,
            });
        }

        // HTTP end is inclusive, ours is not
        let end = end_str.parse::<i64>().ok()?.checked_add(1)?;
        if start >= end {
            return None;
        }
        Some(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Resolve against a resource length into `(start, stop)`, stop exclusive
    ///
    /// Returns `None` when the length is unknown or the range cannot be
    /// satisfied. A suffix longer than the resource selects all of it.
    pub fn range_for_length(&self, length: Option<u64>) -> Option<(u64, u64)> {
        let length = length?;
        let start = self.start?;
        let signed_length = i64::try_from(length).ok()?;

        let (start, end) = match self.end {
            None if start < 0 => ((signed_length + start).max(0), signed_length),
            None => (start, signed_length),
            Some(end) => (start, end),
        };

        if start < 0 || start >= end || start >= signed_length {
            return None;
        }
        let stop = end.min(signed_length);
        Some((u64::try_from(start).ok()?, u64::try_from(stop).ok()?))
    }

    /// The `Content-Range` a response to this request would carry
    pub fn content_range(&self, length: Option<u64>) -> Option<ContentRange> {
        let (start, stop) = self.range_for_length(length)?;
        ContentRange::new(Some(start), Some(stop), length).ok()
    }
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str) -> Option<ByteRange> {
    let suffix = suffix_str.parse::<i64>().ok()?;
    if suffix == 0 {
        return Some(ByteRange {
            start: None,
            end: None,
        });
    }
    Some(ByteRange {
        start: Some(-suffix),
        end: None,
    })
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, _) => f.write_str("bytes=-0"),
            (Some(start), None) if start < 0 => write!(f, "bytes={start}"),
            (Some(start), None) => write!(f, "bytes={start}-"),
            (Some(start), Some(end)) => write!(f, "bytes={start}-{}", end - 1),
        }
    }
}
