//! Content negotiation module
//!
//! `Accept`-family negotiators built on top of [`quality`](super::quality).
//! A negotiator is immutable: it is parsed once from a header value and
//! combined with `+` into new values.
//!
//! Four matching flavours exist, selected by [`AcceptKind`]:
//! - `Generic`: exact, case-insensitive tokens (`Accept-Encoding`, ...)
//! - `Mime`: `type/subtype` with `*` wildcards (`Accept`)
//! - `Charset`: like `Generic`, with `iso-8859-1` implicitly acceptable
//! - `Language`: primary-tag prefix matching (`Accept-Language`)

use std::fmt;
use std::ops::Add;

use super::mime::{media_range_matches, normalize_media_range, HTML_TYPES};
use super::quality::{format_quality_list, parse_quality_list, wildcard_count, QualityEntry};
use crate::error::{Error, Result};

const LATIN1: &str = "iso-8859-1";

/// Matching flavour of a negotiator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptKind {
    Generic,
    Mime,
    Charset,
    Language,
}

impl AcceptKind {
    fn parse(self, value: &str) -> Vec<QualityEntry> {
        let entries = parse_quality_list(value);
        match self {
            Self::Generic | Self::Language => entries,
            Self::Mime => entries
                .into_iter()
                .filter_map(|e| {
                    normalize_media_range(&e.token).map(|token| QualityEntry::new(token, e.quality))
                })
                .collect(),
            Self::Charset => {
                let mut entries: Vec<_> = entries
                    .into_iter()
                    .map(|e| QualityEntry::new(e.token.to_ascii_lowercase(), e.quality))
                    .collect();
                if !entries.iter().any(|e| e.token == "*" || e.token == LATIN1) {
                    entries.push(QualityEntry::new(LATIN1, 1.0));
                }
                entries
            }
        }
    }

    fn matches(self, mask: &str, offer: &str) -> bool {
        match self {
            Self::Generic | Self::Charset => mask == "*" || mask.eq_ignore_ascii_case(offer),
            Self::Mime => media_range_matches(mask, offer),
            Self::Language => {
                let offer = offer.replace('_', "-").to_ascii_lowercase();
                let mask = mask.to_ascii_lowercase();
                mask == "*"
                    || offer == mask
                    || offer.split('-').next() == Some(mask.as_str())
                    || mask.split('-').next() == Some(offer.as_str())
            }
        }
    }
}

/// A server-side candidate for [`Accept::best_match`]
#[derive(Debug, Clone, PartialEq)]
pub struct OfferSpec {
    pub value: String,
    /// Server preference, multiplied with the client quality
    pub server_quality: f64,
}

impl OfferSpec {
    pub fn new(value: impl Into<String>, server_quality: f64) -> Self {
        Self {
            value: value.into(),
            server_quality,
        }
    }
}

impl From<&str> for OfferSpec {
    fn from(value: &str) -> Self {
        Self::new(value, 1.0)
    }
}

impl From<String> for OfferSpec {
    fn from(value: String) -> Self {
        Self::new(value, 1.0)
    }
}

impl From<(&str, f64)> for OfferSpec {
    fn from((value, server_quality): (&str, f64)) -> Self {
        Self::new(value, server_quality)
    }
}

impl From<(String, f64)> for OfferSpec {
    fn from((value, server_quality): (String, f64)) -> Self {
        Self::new(value, server_quality)
    }
}

fn check_offer(offer: &str) -> Result<()> {
    if offer.contains('*') {
        return Err(Error::WildcardOffer(offer.to_string()));
    }
    Ok(())
}

/// A parsed Accept-family header
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptHeader {
    kind: AcceptKind,
    value: String,
    parsed: Vec<QualityEntry>,
    nonzero: Vec<QualityEntry>,
}

impl AcceptHeader {
    fn new(kind: AcceptKind, value: &str) -> Self {
        let parsed = kind.parse(value);
        let nonzero = parsed.iter().filter(|e| e.quality > 0.0).cloned().collect();
        Self {
            kind,
            value: value.to_string(),
            parsed,
            nonzero,
        }
    }

    fn matches_any(&self, offer: &str) -> bool {
        self.nonzero
            .iter()
            .any(|e| self.kind.matches(&e.token, offer))
    }

    fn best_match(&self, offers: &[OfferSpec], default: Option<String>) -> Option<String> {
        let mut best_quality = -1.0_f64;
        let mut best_offer = default;
        // Wildcard count of the mask behind the current best, "*/*" to start
        let mut matched_by = 2;

        for offer in offers {
            for entry in &self.nonzero {
                let possible = offer.server_quality * entry.quality;
                let tie = (possible - best_quality).abs() < f64::EPSILON;
                if !tie && possible < best_quality {
                    continue;
                }
                // On equal quality only a strictly more specific mask wins
                if tie && matched_by <= entry.wildcards() {
                    continue;
                }
                if self.kind.matches(&entry.token, &offer.value) {
                    best_quality = possible;
                    best_offer = Some(offer.value.clone());
                    matched_by = wildcard_count(&entry.token);
                }
            }
        }
        best_offer
    }
}

/// Accept-family negotiator
///
/// `Any` stands for an absent header (everything is acceptable), `None`
/// for a context where nothing can be negotiated.
#[derive(Debug, Clone, PartialEq)]
pub enum Accept {
    Any(AcceptKind),
    None(AcceptKind),
    Header(AcceptHeader),
}

impl Accept {
    /// Parse a header value; never fails
    ///
    /// # Examples
    /// ```
    /// use yarhs_conditional::http::accept::{Accept, AcceptKind};
    ///
    /// let accept = Accept::parse(AcceptKind::Mime, "text/html;q=0.5, foo/bar");
    /// let best = accept.best_match(["text/html", "foo/bar"], None).unwrap();
    /// assert_eq!(best.as_deref(), Some("foo/bar"));
    /// ```
    pub fn parse(kind: AcceptKind, value: &str) -> Self {
        Self::Header(AcceptHeader::new(kind, value))
    }

    /// Build from an optional header, absence meaning `Any`
    pub fn from_header(kind: AcceptKind, value: Option<&str>) -> Self {
        value.map_or(Self::Any(kind), |v| Self::parse(kind, v))
    }

    pub fn generic(value: &str) -> Self {
        Self::parse(AcceptKind::Generic, value)
    }

    pub fn mime(value: &str) -> Self {
        Self::parse(AcceptKind::Mime, value)
    }

    pub fn charset(value: &str) -> Self {
        Self::parse(AcceptKind::Charset, value)
    }

    pub fn language(value: &str) -> Self {
        Self::parse(AcceptKind::Language, value)
    }

    pub const fn kind(&self) -> AcceptKind {
        match self {
            Self::Any(kind) | Self::None(kind) => *kind,
            Self::Header(h) => h.kind,
        }
    }

    /// Raw header value, `None` for the sentinels
    pub fn header_value(&self) -> Option<&str> {
        match self {
            Self::Header(h) => Some(&h.value),
            Self::Any(_) | Self::None(_) => None,
        }
    }

    /// All parsed entries in header order, zero qualities included
    pub fn entries(&self) -> &[QualityEntry] {
        match self {
            Self::Header(h) => &h.parsed,
            Self::Any(_) | Self::None(_) => &[],
        }
    }

    /// Acceptable masks, highest quality first
    pub fn masks(&self) -> Vec<&str> {
        let Self::Header(h) = self else {
            return Vec::new();
        };
        let mut entries: Vec<_> = h.nonzero.iter().collect();
        entries.sort_by(|a, b| b.quality.total_cmp(&a.quality));
        entries.into_iter().map(|e| e.token.as_str()).collect()
    }

    /// Whether any non-zero entry matches `offer`
    pub fn contains(&self, offer: &str) -> Result<bool> {
        check_offer(offer)?;
        Ok(match self {
            Self::Any(_) => true,
            Self::None(_) => false,
            Self::Header(h) => h.matches_any(offer),
        })
    }

    /// Highest `client quality * modifier` among entries matching `offer`
    pub fn quality(&self, offer: &str, modifier: f64) -> Result<Option<f64>> {
        check_offer(offer)?;
        Ok(match self {
            Self::Any(_) => Some(modifier),
            Self::None(_) => None,
            Self::Header(h) => h
                .nonzero
                .iter()
                .filter(|e| h.kind.matches(&e.token, offer))
                .map(|e| e.quality * modifier)
                .reduce(f64::max),
        })
    }

    /// Pick the offer the client prefers
    ///
    /// Offers are scanned in the given order against the header entries in
    /// header order. A candidate replaces the current best when its combined
    /// quality is higher, or equal and reached through a mask with fewer
    /// wildcards. `default` is returned when nothing matches.
    pub fn best_match<I, O>(&self, offers: I, default: Option<&str>) -> Result<Option<String>>
    where
        I: IntoIterator<Item = O>,
        O: Into<OfferSpec>,
    {
        let offers: Vec<OfferSpec> = offers.into_iter().map(Into::into).collect();
        for offer in &offers {
            check_offer(&offer.value)?;
        }
        let default = default.map(str::to_string);

        Ok(match self {
            Self::Header(h) => h.best_match(&offers, default),
            Self::None(_) => default,
            Self::Any(_) => {
                let mut best_quality = -1.0_f64;
                let mut best_offer = default;
                for offer in offers {
                    if offer.server_quality > best_quality {
                        best_quality = offer.server_quality;
                        best_offer = Some(offer.value);
                    }
                }
                best_offer
            }
        })
    }

    /// Whether a MIME negotiator admits an HTML-ish type
    pub fn accepts_html(&self) -> bool {
        match self {
            Self::Any(_) => true,
            Self::None(_) => false,
            Self::Header(h) => HTML_TYPES.iter().any(|t| h.matches_any(t)),
        }
    }
}

impl fmt::Display for Accept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(h) => f.write_str(&format_quality_list(&h.parsed)),
            Self::Any(_) | Self::None(_) => Ok(()),
        }
    }
}

fn join_values(mine: &str, other: &str) -> String {
    match (mine.trim().is_empty(), other.trim().is_empty()) {
        (_, true) => mine.to_string(),
        (true, false) => other.to_string(),
        (false, false) => format!("{mine}, {other}"),
    }
}

impl Add for Accept {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Header(a), Self::Header(b)) => Self::parse(a.kind, &join_values(&a.value, &b.value)),
            (Self::Header(a), _) => Self::Header(a),
            (_, Self::Header(b)) => Self::Header(b),
            (sentinel, _) => sentinel,
        }
    }
}

impl Add<&str> for Accept {
    type Output = Self;

    fn add(self, other: &str) -> Self {
        match self {
            Self::Header(a) => Self::parse(a.kind, &join_values(&a.value, other)),
            sentinel if other.trim().is_empty() => sentinel,
            sentinel => Self::parse(sentinel.kind(), other),
        }
    }
}
