//! Quality list parsing module
//!
//! Parses comma-separated `token;q=N` headers (Accept, Accept-Charset,
//! Accept-Language, Accept-Encoding) into ordered `(token, quality)` pairs.
//! Parsing is tolerant and never fails.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// One `token;q=N` item of a quality list
#[derive(Debug, Clone, PartialEq)]
pub struct QualityEntry {
    /// Mask or token as written by the client
    pub token: String,
    /// Client weight in `[0, 1]`, 0 means "not acceptable"
    pub quality: f64,
}

impl QualityEntry {
    pub fn new(token: impl Into<String>, quality: f64) -> Self {
        Self {
            token: token.into(),
            quality,
        }
    }

    /// Number of `*` in the token, lower is more specific
    #[inline]
    pub fn wildcards(&self) -> usize {
        wildcard_count(&self.token)
    }
}

impl fmt::Display for QualityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if (self.quality - 1.0).abs() < f64::EPSILON {
            return f.write_str(&self.token);
        }
        // Keep the digits the value was written with, three at most
        let repr = self.quality.to_string();
        let digits = repr.split_once('.').map_or(0, |(_, frac)| frac.len().min(3));
        write!(f, "{};q={:.*}", self.token, digits, self.quality)
    }
}

pub(crate) fn wildcard_count(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'*').count()
}

fn part_regex() -> &'static Regex {
    static PART_RE: OnceLock<Regex> = OnceLock::new();
    PART_RE.get_or_init(|| {
        Regex::new(r",\s*([^\s;,\n]+)(?:[^,]*?;\s*q=([0-9.]*))?")
            .expect("quality list pattern is valid")
    })
}

/// Parse a quality list header
///
/// Stray `q` items are dropped, an unparseable q-value counts as 1, and a
/// parseable one is clamped into `[0, 1]`. Header order is preserved.
///
/// # Examples
/// ```
/// use yarhs_conditional::http::quality::parse_quality_list;
///
/// let entries = parse_quality_list("text/html;q=0.5, text/plain");
/// assert_eq!(entries[0].token, "text/html");
/// assert_eq!(entries[0].quality, 0.5);
/// assert_eq!(entries[1].quality, 1.0);
///
/// // Malformed q-values never fail the header
/// assert_eq!(parse_quality_list("a;q=0.1.2")[0].quality, 1.0);
/// ```
pub fn parse_quality_list(value: &str) -> Vec<QualityEntry> {
    let haystack = format!(",{value}");
    part_regex()
        .captures_iter(&haystack)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            if name == "q" {
                return None;
            }
            let quality = caps
                .get(2)
                .and_then(|q| q.as_str().parse::<f64>().ok())
                .map_or(1.0, |q| q.clamp(0.0, 1.0));
            Some(QualityEntry::new(name, quality))
        })
        .collect()
}

/// Serialize entries back to header form
pub fn format_quality_list(entries: &[QualityEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
