//! Request and response metadata module
//!
//! Reads the headers the conditional machinery cares about out of plain
//! header lists or `hyper` types. Everything is parsed once, up front, and
//! malformed values read as absent.

use chrono::{DateTime, Utc};
use hyper::http::response::Parts;
use hyper::{HeaderMap, Method, Request, StatusCode};

use super::accept::{Accept, AcceptKind};
use super::content_range::ContentRange;
use super::date::parse_http_date;
use super::etag::{ETag, EntityTag, Strength};
use super::if_range::IfRange;
use super::range::ByteRange;
use crate::logger;

/// Ordered `(name, value)` header pairs
pub type HeaderList = Vec<(String, String)>;

/// First value of a header, case-insensitive name
pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// All values of a header joined with `", "`, for list-valued headers
pub fn joined_header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .iter()
        .filter(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
        .collect();
    (!values.is_empty()).then(|| values.join(", "))
}

/// Copy of `headers` without the named ones
pub fn filter_headers(headers: &[(String, String)], exclude: &[&str]) -> HeaderList {
    headers
        .iter()
        .filter(|(n, _)| !exclude.iter().any(|e| n.eq_ignore_ascii_case(e)))
        .cloned()
        .collect()
}

/// Convert a `HeaderMap`, skipping values that are not visible ASCII
pub fn header_list_from_map(map: &HeaderMap) -> HeaderList {
    map.iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// The request side of a conditional decision
#[derive(Debug, Clone)]
pub struct ConditionalRequest {
    pub method: Method,
    pub if_match: ETag,
    pub if_none_match: ETag,
    pub if_modified_since: Option<DateTime<Utc>>,
    pub if_unmodified_since: Option<DateTime<Utc>>,
    pub if_range: IfRange,
    pub range: Option<ByteRange>,
    pub accept: Accept,
    pub accept_charset: Accept,
    pub accept_language: Accept,
    pub accept_encoding: Accept,
}

impl ConditionalRequest {
    /// A request without any conditional or negotiation headers
    pub const fn new(method: Method) -> Self {
        Self {
            method,
            if_match: ETag::None,
            if_none_match: ETag::None,
            if_modified_since: None,
            if_unmodified_since: None,
            if_range: IfRange::Unconditional,
            range: None,
            accept: Accept::Any(AcceptKind::Mime),
            accept_charset: Accept::Any(AcceptKind::Charset),
            accept_language: Accept::Any(AcceptKind::Language),
            accept_encoding: Accept::Any(AcceptKind::Generic),
        }
    }

    /// Parse from a header list
    ///
    /// # Examples
    /// ```
    /// use hyper::Method;
    /// use yarhs_conditional::http::headers::ConditionalRequest;
    ///
    /// let headers = vec![("Range".to_string(), "bytes=0-9".to_string())];
    /// let req = ConditionalRequest::from_headers(Method::GET, &headers);
    /// assert_eq!(req.range.unwrap().range_for_length(Some(100)), Some((0, 10)));
    /// ```
    pub fn from_headers(method: Method, headers: &[(String, String)]) -> Self {
        let single = |name: &str| header_value(headers, name);
        let list = |name: &str| joined_header_value(headers, name);

        let range = single("Range").and_then(|value| {
            let parsed = ByteRange::parse(value);
            if parsed.is_none() {
                logger::log_ignored_header("Range", value);
            }
            parsed
        });

        Self {
            method,
            if_match: ETag::from_header(list("If-Match").as_deref(), Strength::Strong),
            if_none_match: ETag::from_header(list("If-None-Match").as_deref(), Strength::Weak),
            if_modified_since: parse_date_header(single("If-Modified-Since"), "If-Modified-Since"),
            if_unmodified_since: parse_date_header(
                single("If-Unmodified-Since"),
                "If-Unmodified-Since",
            ),
            if_range: IfRange::from_header(single("If-Range")),
            range,
            accept: Accept::from_header(AcceptKind::Mime, list("Accept").as_deref()),
            accept_charset: Accept::from_header(AcceptKind::Charset, list("Accept-Charset").as_deref()),
            accept_language: Accept::from_header(
                AcceptKind::Language,
                list("Accept-Language").as_deref(),
            ),
            accept_encoding: Accept::from_header(
                AcceptKind::Generic,
                list("Accept-Encoding").as_deref(),
            ),
        }
    }

    pub fn from_parts(method: &Method, headers: &HeaderMap) -> Self {
        Self::from_headers(method.clone(), &header_list_from_map(headers))
    }

    pub fn from_request<T>(req: &Request<T>) -> Self {
        Self::from_parts(req.method(), req.headers())
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}

fn parse_date_header(value: Option<&str>, name: &str) -> Option<DateTime<Utc>> {
    let value = value?;
    let date = parse_http_date(value);
    if date.is_none() {
        logger::log_ignored_header(name, value);
    }
    date
}

/// Read-only view of the response a decision is made about
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub status: StatusCode,
    pub headers: HeaderList,
}

impl ResponseMeta {
    pub const fn new(status: StatusCode, headers: HeaderList) -> Self {
        Self { status, headers }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.status, header_list_from_map(&parts.headers))
    }

    pub const fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn etag(&self) -> Option<EntityTag> {
        self.header("ETag").and_then(EntityTag::parse_response)
    }

    /// The response tag, only when it is strong
    pub fn etag_strong(&self) -> Option<String> {
        self.etag().filter(|t| !t.weak).map(|t| t.tag)
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.header("Last-Modified").and_then(parse_http_date)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// An existing, well-formed `Content-Range`
    pub fn content_range(&self) -> Option<ContentRange> {
        self.header("Content-Range").and_then(ContentRange::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{HeaderValue, IF_NONE_MATCH, RANGE};

    fn headers(pairs: &[(&str, &str)]) -> HeaderList {
        pairs
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_request_defaults() {
        let req = ConditionalRequest::from_headers(Method::GET, &[]);
        assert_eq!(req.if_none_match, ETag::None);
        assert_eq!(req.if_range, IfRange::Unconditional);
        assert!(req.range.is_none());
        assert_eq!(req.accept, Accept::Any(AcceptKind::Mime));
        assert!(!req.is_head());
    }

    #[test]
    fn test_request_parsing() {
        let req = ConditionalRequest::from_headers(
            Method::HEAD,
            &headers(&[
                ("if-none-match", "\"a\""),
                ("If-None-Match", "W/\"b\""),
                ("If-Match", "\"c\", W/\"d\""),
                ("If-Modified-Since", "Sun, 06 Nov 1994 08:49:37 GMT"),
                ("Accept-Language", "de"),
                ("range", "bytes=-5"),
            ]),
        );
        assert_eq!(req.if_none_match.tags(), ["a", "b"]);
        assert_eq!(req.if_match.tags(), ["c"]);
        assert!(req.if_modified_since.is_some());
        assert_eq!(req.range.unwrap().start, Some(-5));
        assert!(req.accept_language.contains("de-AT").unwrap());
        assert!(req.is_head());
    }

    #[test]
    fn test_malformed_headers_are_absent() {
        let req = ConditionalRequest::from_headers(
            Method::GET,
            &headers(&[("Range", "lines=1-2"), ("If-Modified-Since", "yesterday")]),
        );
        assert!(req.range.is_none());
        assert!(req.if_modified_since.is_none());
    }

    #[test]
    fn test_request_from_header_map() {
        let mut map = HeaderMap::new();
        map.insert(IF_NONE_MATCH, HeaderValue::from_static("\"v1\""));
        map.insert(RANGE, HeaderValue::from_static("bytes=2-5"));
        let req = ConditionalRequest::from_parts(&Method::GET, &map);
        assert!(req.if_none_match.contains("v1"));
        assert_eq!(req.range.unwrap().end, Some(6));
    }

    #[test]
    fn test_response_meta() {
        let meta = ResponseMeta::new(
            StatusCode::OK,
            headers(&[
                ("ETag", "W/\"v1\""),
                ("Content-Length", "10"),
                ("Last-Modified", "Sun, 06 Nov 1994 08:49:37 GMT"),
                ("Content-Range", "bytes 0-50/10"),
            ]),
        );
        assert_eq!(meta.etag(), Some(EntityTag::weak("v1")));
        assert_eq!(meta.etag_strong(), None);
        assert_eq!(meta.content_length(), Some(10));
        assert!(meta.last_modified().is_some());
        // Invalid for a response, so treated as absent
        assert!(meta.content_range().is_none());
        assert_eq!(meta.status_code(), 200);
    }

    #[test]
    fn test_filter_headers() {
        let list = headers(&[("Content-Length", "1"), ("content-type", "x"), ("ETag", "\"a\"")]);
        let filtered = filter_headers(&list, &["content-length", "Content-Type"]);
        assert_eq!(filtered, headers(&[("ETag", "\"a\"")]));
    }
}
