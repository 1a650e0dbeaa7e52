//! Entity tag module
//!
//! Parses `If-Match` / `If-None-Match` style tag lists and response `ETag`
//! headers, and generates tags for in-memory content.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Strong tag for an in-memory body: `"<length hex>-<crc32 hex>"`
///
/// Depends only on the bytes, never on the build or process.
///
/// # Examples
/// ```
/// use yarhs_conditional::http::etag::generate_etag;
///
/// assert_eq!(generate_etag(b"hello world"), "\"b-0d4a1185\"");
/// ```
pub fn generate_etag(content: &[u8]) -> String {
    format!("\"{:x}-{:08x}\"", content.len(), crc32fast::hash(content))
}

/// Which entries of a tag list take part in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    /// Weak tags are dropped (`If-Match`, `If-Range`)
    Strong,
    /// Weak and strong tags both count (`If-None-Match`)
    Weak,
}

/// A single entity tag, stored unquoted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    pub tag: String,
    pub weak: bool,
}

impl EntityTag {
    pub fn strong(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            weak: false,
        }
    }

    pub fn weak(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            weak: true,
        }
    }

    /// Read a response `ETag` header
    ///
    /// Quotes are optional on input, a `W/` prefix marks the tag weak.
    pub fn parse_response(value: &str) -> Option<Self> {
        let value = value.trim();
        let (weak, rest) = match value.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let tag = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(rest);
        if tag.is_empty() && !rest.starts_with('"') {
            return None;
        }
        Some(Self {
            tag: tag.to_string(),
            weak,
        })
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            f.write_str("W/")?;
        }
        write!(f, "\"{}\"", self.tag)
    }
}

fn etag_regex() -> &'static Regex {
    static ETAG_RE: OnceLock<Regex> = OnceLock::new();
    ETAG_RE.get_or_init(|| {
        Regex::new(r#"(W/)?"((?:\\.|[^"\\])*)""#).expect("entity tag pattern is valid")
    })
}

/// An entity tag condition from a request header
///
/// `Any` is the `*` wildcard, `None` an absent header. `Set` holds the
/// tags that survived the [`Strength`] the header was parsed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ETag {
    Any,
    None,
    Set(Vec<EntityTag>),
}

impl ETag {
    /// Parse a tag list; never fails
    ///
    /// # Examples
    /// ```
    /// use yarhs_conditional::http::etag::{ETag, Strength};
    ///
    /// assert_eq!(ETag::parse(r#""a", W/"b""#, Strength::Strong).tags(), ["a"]);
    /// assert_eq!(ETag::parse(r#""a", W/"b""#, Strength::Weak).tags(), ["a", "b"]);
    /// assert_eq!(ETag::parse("*", Strength::Strong), ETag::Any);
    /// ```
    pub fn parse(value: &str, strength: Strength) -> Self {
        let value = value.trim();
        if value == "*" {
            return Self::Any;
        }
        let tags = etag_regex()
            .captures_iter(value)
            .filter_map(|caps| {
                let weak = caps.get(1).is_some();
                let tag = caps.get(2)?.as_str();
                (strength == Strength::Weak || !weak).then(|| EntityTag {
                    tag: tag.to_string(),
                    weak,
                })
            })
            .collect();
        Self::Set(tags)
    }

    /// Build from an optional header, absence meaning `None`
    pub fn from_header(value: Option<&str>, strength: Strength) -> Self {
        value.map_or(Self::None, |v| Self::parse(v, strength))
    }

    /// Whether the header constrains anything (an empty list does not)
    pub const fn is_present(&self) -> bool {
        match self {
            Self::Any => true,
            Self::None => false,
            Self::Set(tags) => !tags.is_empty(),
        }
    }

    /// Membership test for an unquoted tag
    pub fn contains(&self, tag: &str) -> bool {
        match self {
            Self::Any => true,
            Self::None => false,
            Self::Set(tags) => tags.iter().any(|t| t.tag == tag),
        }
    }

    /// Unquoted tags of a `Set`, empty for the sentinels
    pub fn tags(&self) -> Vec<&str> {
        match self {
            Self::Set(tags) => tags.iter().map(|t| t.tag.as_str()).collect(),
            Self::Any | Self::None => Vec::new(),
        }
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::None => Ok(()),
            Self::Set(tags) => {
                for (i, tag) in tags.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{tag}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tags_are_fixed_values() {
        assert_eq!(generate_etag(b""), "\"0-00000000\"");
        assert_eq!(generate_etag(b"hello world"), "\"b-0d4a1185\"");
        assert_ne!(generate_etag(b"content a"), generate_etag(b"content b"));
    }

    #[test]
    fn test_generated_tag_round_trips() {
        let header = generate_etag(b"body");
        let parsed = EntityTag::parse_response(&header).unwrap();
        assert!(!parsed.weak);
        assert!(ETag::parse(&header, Strength::Strong).contains(&parsed.tag));
    }

    #[test]
    fn test_strength_filters_weak() {
        let header = r#""a", W/"b""#;
        assert_eq!(ETag::parse(header, Strength::Strong).tags(), ["a"]);
        assert_eq!(ETag::parse(header, Strength::Weak).tags(), ["a", "b"]);
    }

    #[test]
    fn test_contains() {
        let etag = ETag::parse(r#""xyz", "abc123""#, Strength::Weak);
        assert!(etag.contains("abc123"));
        assert!(!etag.contains("different"));
        assert!(ETag::Any.contains("anything"));
        assert!(!ETag::None.contains("anything"));
    }

    #[test]
    fn test_escaped_quote() {
        let etag = ETag::parse(r#""a\"b", "c""#, Strength::Strong);
        assert_eq!(etag.tags(), [r#"a\"b"#, "c"]);
    }

    #[test]
    fn test_garbage_is_empty_set() {
        let etag = ETag::parse("no quotes here", Strength::Weak);
        assert_eq!(etag, ETag::Set(Vec::new()));
        assert!(!etag.is_present());
        assert!(!ETag::from_header(None, Strength::Weak).is_present());
        assert!(ETag::from_header(Some("*"), Strength::Weak).is_present());
    }

    #[test]
    fn test_display() {
        let etag = ETag::parse(r#" "a" ,W/"b""#, Strength::Weak);
        assert_eq!(etag.to_string(), r#""a", W/"b""#);
        assert_eq!(ETag::Any.to_string(), "*");
    }

    #[test]
    fn test_parse_response() {
        assert_eq!(EntityTag::parse_response("\"v1\""), Some(EntityTag::strong("v1")));
        assert_eq!(EntityTag::parse_response("W/\"v1\""), Some(EntityTag::weak("v1")));
        assert_eq!(EntityTag::parse_response("v1"), Some(EntityTag::strong("v1")));
        assert_eq!(EntityTag::parse_response("\"\""), Some(EntityTag::strong("")));
        assert_eq!(EntityTag::parse_response(""), None);
    }
}
