//! Conditional response module
//!
//! Decides, per request, whether a response goes out unchanged, becomes a
//! 304, is cut down to a 206, or is replaced by a 416 (or, when enabled, a
//! 412), and rewrites the status, headers and body to match.

use std::fmt;

use hyper::{Method, Response, StatusCode};

use super::body::{Body, BoxBody, ChunkedBody, EmptyBody};
use super::content_range::ContentRange;
use super::headers::{ConditionalRequest, HeaderList, ResponseMeta};
use super::range::ByteRange;
use super::response::{
    build_206_headers, build_304_headers, build_412_headers, build_416_response,
    build_http_response, status_line,
};
use super::slicer::StreamSlicer;
use crate::config::{ConditionalConfig, LoggingConfig};
use crate::error::Result;
use crate::logger::{self, DecisionLogEntry};

/// What the responder decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Response goes out unchanged
    Pass,
    NotModified,
    /// Body cut to the given range
    Partial(ContentRange),
    RangeNotSatisfiable { range: ByteRange, length: u64 },
    PreconditionFailed,
}

impl Outcome {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::NotModified => "not_modified",
            Self::Partial(_) => "partial",
            Self::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Self::PreconditionFailed => "precondition_failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A response after conditional processing
pub struct ConditionalResponse {
    pub outcome: Outcome,
    pub status: StatusCode,
    pub headers: HeaderList,
    pub body: BoxBody,
    /// Set for `HEAD`: headers are final, the body must not be sent
    pub discard_body: bool,
}

impl ConditionalResponse {
    /// e.g. `"206 Partial Content"`
    pub fn status_line(&self) -> String {
        status_line(self.status)
    }

    /// Convert into a `hyper::Response` carrying the body iterator
    pub fn into_http_response(self) -> Result<Response<BoxBody>> {
        build_http_response(self.status, &self.headers, self.body)
    }
}

impl fmt::Debug for ConditionalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalResponse")
            .field("outcome", &self.outcome)
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("discard_body", &self.discard_body)
            .finish_non_exhaustive()
    }
}

/// Applies conditional request semantics to responses
#[derive(Debug, Clone)]
pub struct ConditionalResponder {
    enforce_preconditions: bool,
    safe_methods: Vec<Method>,
    decision_log_format: Option<String>,
}

impl Default for ConditionalResponder {
    fn default() -> Self {
        Self::new(&ConditionalConfig::default(), &LoggingConfig::default())
    }
}

impl ConditionalResponder {
    pub fn new(config: &ConditionalConfig, logging: &LoggingConfig) -> Self {
        let safe_methods = config
            .safe_methods
            .iter()
            .filter_map(|m| match Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()) {
                Ok(method) => Some(method),
                Err(_) => {
                    logger::log_warning(&format!("Ignoring invalid safe method {m:?}"));
                    None
                }
            })
            .collect();

        Self {
            enforce_preconditions: config.enforce_preconditions,
            safe_methods,
            decision_log_format: logging
                .decision_log
                .then(|| logging.decision_log_format.clone()),
        }
    }

    fn is_safe(&self, method: &Method) -> bool {
        self.safe_methods.contains(method)
    }

    /// Decide the outcome without touching any body
    ///
    /// Checked in order: `If-None-Match` (only when the response has an
    /// `ETag`), otherwise `If-Modified-Since`; then the optional 412 checks;
    /// then `Range` gated by `If-Range`.
    pub fn decide(&self, req: &ConditionalRequest, meta: &ResponseMeta) -> Outcome {
        if !self.is_safe(&req.method) {
            return Outcome::Pass;
        }

        let not_modified = match meta.etag() {
            Some(etag) if req.if_none_match.is_present() => req.if_none_match.contains(&etag.tag),
            _ => match (req.if_modified_since, meta.last_modified()) {
                (Some(since), Some(modified)) => modified <= since,
                _ => false,
            },
        };
        if not_modified {
            return Outcome::NotModified;
        }

        if self.enforce_preconditions && precondition_failed(req, meta) {
            return Outcome::PreconditionFailed;
        }

        range_outcome(req, meta).unwrap_or(Outcome::Pass)
    }

    /// Decide and rewrite the response
    ///
    /// Replaced bodies are closed here without being read. For a 206 the
    /// body is wrapped so that only the selected bytes are pulled through.
    pub fn respond<B: Body + 'static>(
        &self,
        req: &ConditionalRequest,
        meta: ResponseMeta,
        mut body: B,
    ) -> ConditionalResponse {
        let outcome = self.decide(req, &meta);

        let (status, headers, mut body): (StatusCode, HeaderList, BoxBody) = match &outcome {
            Outcome::Pass => (meta.status, meta.headers, Box::new(body)),
            Outcome::NotModified => {
                body.close();
                (StatusCode::NOT_MODIFIED, build_304_headers(&meta.headers), Box::new(EmptyBody))
            }
            Outcome::PreconditionFailed => {
                body.close();
                (StatusCode::PRECONDITION_FAILED, build_412_headers(&meta.headers), Box::new(EmptyBody))
            }
            Outcome::RangeNotSatisfiable { range, length } => {
                body.close();
                let (headers, message) = build_416_response(range, *length, &meta.headers);
                (StatusCode::RANGE_NOT_SATISFIABLE, headers, Box::new(ChunkedBody::single(message)))
            }
            Outcome::Partial(content_range) => {
                let (start, stop) = (
                    content_range.start().unwrap_or_default(),
                    content_range.stop().unwrap_or_default(),
                );
                (
                    StatusCode::PARTIAL_CONTENT,
                    build_206_headers(content_range, &meta.headers),
                    Box::new(StreamSlicer::new(body, start, stop)),
                )
            }
        };

        let discard_body = req.is_head();
        if discard_body {
            body.close();
            body = Box::new(EmptyBody);
        }

        let response = ConditionalResponse {
            outcome,
            status,
            headers,
            body,
            discard_body,
        };
        if let Some(format) = &self.decision_log_format {
            logger::log_decision(&decision_entry(req, &response), format);
        }
        response
    }
}

/// `If-Match` / `If-Unmodified-Since`, each only when it can be evaluated
fn precondition_failed(req: &ConditionalRequest, meta: &ResponseMeta) -> bool {
    if req.if_match.is_present() {
        let matched = meta
            .etag_strong()
            .is_some_and(|tag| req.if_match.contains(&tag));
        return !matched;
    }
    match (req.if_unmodified_since, meta.last_modified()) {
        (Some(since), Some(modified)) => modified > since,
        _ => false,
    }
}

/// 206 or 416, when the request has a usable range for this response
fn range_outcome(req: &ConditionalRequest, meta: &ResponseMeta) -> Option<Outcome> {
    let range = req.range?;
    if !req
        .if_range
        .permits(meta.etag_strong().as_deref(), meta.last_modified())
    {
        return None;
    }
    if meta.status != StatusCode::OK || meta.content_range().is_some() {
        return None;
    }
    let length = meta.content_length()?;

    Some(match range.content_range(Some(length)) {
        Some(content_range) => Outcome::Partial(content_range),
        None => Outcome::RangeNotSatisfiable { range, length },
    })
}

fn decision_entry(req: &ConditionalRequest, response: &ConditionalResponse) -> DecisionLogEntry {
    let mut entry = DecisionLogEntry::new(
        req.method.to_string(),
        response.status.as_u16(),
        response.outcome.name().to_string(),
    );
    let non_empty = |s: String| (!s.is_empty()).then_some(s);
    entry.range = req.range.map(|r| r.to_string());
    entry.content_range = match &response.outcome {
        Outcome::Partial(content_range) => Some(content_range.to_string()),
        Outcome::RangeNotSatisfiable { length, .. } => {
            Some(ContentRange::unsatisfied(*length).to_string())
        }
        _ => None,
    };
    entry.etag = response
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("ETag"))
        .map(|(_, v)| v.clone());
    entry.if_none_match = non_empty(req.if_none_match.to_string());
    entry.if_range = non_empty(req.if_range.to_string());
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BodyError;
    use crate::http::body::collect_body;
    use crate::http::headers::header_value;
    use hyper::body::Bytes;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const LAST_MODIFIED: &str = "Mon, 01 Jan 2024 12:00:00 GMT";

    /// Records whether it was closed and how many chunks were pulled
    struct TrackedBody {
        inner: ChunkedBody,
        closed: Arc<AtomicBool>,
    }

    impl TrackedBody {
        fn new(chunks: &[&'static [u8]]) -> (Self, Arc<AtomicBool>) {
            let closed = Arc::new(AtomicBool::new(false));
            let body = Self {
                inner: ChunkedBody::new(chunks.iter().copied()),
                closed: Arc::clone(&closed),
            };
            (body, closed)
        }
    }

    impl Iterator for TrackedBody {
        type Item = Result<Bytes, BodyError>;

        fn next(&mut self) -> Option<Self::Item> {
            self.inner.next()
        }
    }

    impl Body for TrackedBody {
        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
            self.inner.close();
        }
    }

    fn request(method: Method, pairs: &[(&str, &str)]) -> ConditionalRequest {
        let headers: HeaderList = pairs
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect();
        ConditionalRequest::from_headers(method, &headers)
    }

    fn meta() -> ResponseMeta {
        ResponseMeta::new(
            StatusCode::OK,
            vec![
                ("Content-Type".to_string(), "text/plain".to_string()),
                ("Content-Length".to_string(), "10".to_string()),
                ("ETag".to_string(), "\"v1\"".to_string()),
                ("Last-Modified".to_string(), LAST_MODIFIED.to_string()),
            ],
        )
    }

    fn respond(req: &ConditionalRequest) -> (ConditionalResponse, Arc<AtomicBool>) {
        let (body, closed) = TrackedBody::new(&[b"0123", b"456789"]);
        (ConditionalResponder::default().respond(req, meta(), body), closed)
    }

    #[test]
    fn test_pass_through() {
        let req = request(Method::GET, &[]);
        let (response, closed) = respond(&req);
        assert_eq!(response.outcome, Outcome::Pass);
        assert_eq!(response.status_line(), "200 OK");
        assert_eq!(response.headers, meta().headers);
        assert!(!response.discard_body);
        assert_eq!(collect_body(response.body).unwrap(), b"0123456789");
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_if_none_match_not_modified() {
        let req = request(Method::GET, &[("If-None-Match", "\"v1\"")]);
        let (response, closed) = respond(&req);
        assert_eq!(response.outcome, Outcome::NotModified);
        assert_eq!(response.status_line(), "304 Not Modified");
        assert_eq!(header_value(&response.headers, "Content-Length"), None);
        assert_eq!(header_value(&response.headers, "Content-Type"), None);
        assert_eq!(header_value(&response.headers, "ETag"), Some("\"v1\""));
        assert!(closed.load(Ordering::SeqCst));
        assert!(collect_body(response.body).unwrap().is_empty());
    }

    #[test]
    fn test_if_none_match_weak_and_wildcard() {
        let responder = ConditionalResponder::default();
        let req = request(Method::GET, &[("If-None-Match", "W/\"v1\"")]);
        assert_eq!(responder.decide(&req, &meta()), Outcome::NotModified);
        let req = request(Method::GET, &[("If-None-Match", "*")]);
        assert_eq!(responder.decide(&req, &meta()), Outcome::NotModified);
    }

    #[test]
    fn test_if_none_match_miss_skips_if_modified_since() {
        let req = request(
            Method::GET,
            &[("If-None-Match", "\"v2\""), ("If-Modified-Since", LAST_MODIFIED)],
        );
        assert_eq!(ConditionalResponder::default().decide(&req, &meta()), Outcome::Pass);
    }

    #[test]
    fn test_if_modified_since() {
        let responder = ConditionalResponder::default();
        let req = request(Method::GET, &[("If-Modified-Since", LAST_MODIFIED)]);
        assert_eq!(responder.decide(&req, &meta()), Outcome::NotModified);

        let req = request(Method::GET, &[("If-Modified-Since", "Mon, 01 Jan 2024 11:59:59 GMT")]);
        assert_eq!(responder.decide(&req, &meta()), Outcome::Pass);
    }

    #[test]
    fn test_if_modified_since_used_without_response_etag() {
        let meta = ResponseMeta::new(
            StatusCode::OK,
            vec![("Last-Modified".to_string(), LAST_MODIFIED.to_string())],
        );
        let req = request(
            Method::GET,
            &[("If-None-Match", "\"v1\""), ("If-Modified-Since", LAST_MODIFIED)],
        );
        assert_eq!(ConditionalResponder::default().decide(&req, &meta), Outcome::NotModified);
    }

    #[test]
    fn test_partial_content() {
        let req = request(Method::GET, &[("Range", "bytes=2-5")]);
        let (response, closed) = respond(&req);
        assert_eq!(response.status_line(), "206 Partial Content");
        assert_eq!(header_value(&response.headers, "Content-Range"), Some("bytes 2-5/10"));
        assert_eq!(header_value(&response.headers, "Content-Length"), Some("4"));
        assert_eq!(header_value(&response.headers, "Content-Type"), Some("text/plain"));
        assert_eq!(collect_body(response.body).unwrap(), b"2345");
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_suffix_range() {
        let req = request(Method::GET, &[("Range", "bytes=-3")]);
        let (response, _) = respond(&req);
        assert_eq!(header_value(&response.headers, "Content-Range"), Some("bytes 7-9/10"));
        assert_eq!(collect_body(response.body).unwrap(), b"789");
    }

    #[test]
    fn test_range_not_satisfiable() {
        let req = request(Method::GET, &[("Range", "bytes=100-200")]);
        let (response, closed) = respond(&req);
        assert_eq!(response.status_line(), "416 Requested Range Not Satisfiable");
        assert_eq!(header_value(&response.headers, "Content-Range"), Some("bytes */10"));
        assert_eq!(header_value(&response.headers, "ETag"), Some("\"v1\""));
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(
            collect_body(response.body).unwrap(),
            b"Requested range not satisfiable: bytes=100-200"
        );
    }

    #[test]
    fn test_range_needs_known_length_and_200() {
        let responder = ConditionalResponder::default();
        let req = request(Method::GET, &[("Range", "bytes=2-5")]);

        let unknown_length = ResponseMeta::new(StatusCode::OK, vec![]);
        assert_eq!(responder.decide(&req, &unknown_length), Outcome::Pass);

        let mut not_ok = meta();
        not_ok.status = StatusCode::NOT_FOUND;
        assert_eq!(responder.decide(&req, &not_ok), Outcome::Pass);

        let mut already_ranged = meta();
        already_ranged
            .headers
            .push(("Content-Range".to_string(), "bytes 0-9/20".to_string()));
        assert_eq!(responder.decide(&req, &already_ranged), Outcome::Pass);
    }

    #[test]
    fn test_if_range() {
        let responder = ConditionalResponder::default();
        let matching = request(Method::GET, &[("Range", "bytes=2-5"), ("If-Range", "\"v1\"")]);
        assert!(matches!(responder.decide(&matching, &meta()), Outcome::Partial(_)));

        let stale = request(Method::GET, &[("Range", "bytes=2-5"), ("If-Range", "\"v0\"")]);
        assert_eq!(responder.decide(&stale, &meta()), Outcome::Pass);

        let by_date = request(Method::GET, &[("Range", "bytes=2-5"), ("If-Range", LAST_MODIFIED)]);
        assert!(matches!(responder.decide(&by_date, &meta()), Outcome::Partial(_)));

        let mut weak = meta();
        weak.headers[2].1 = "W/\"v1\"".to_string();
        assert_eq!(responder.decide(&matching, &weak), Outcome::Pass);
    }

    #[test]
    fn test_head_discards_body() {
        let req = request(Method::HEAD, &[("Range", "bytes=2-5")]);
        let (response, closed) = respond(&req);
        assert!(response.discard_body);
        assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(header_value(&response.headers, "Content-Length"), Some("4"));
        assert!(closed.load(Ordering::SeqCst));
        assert!(collect_body(response.body).unwrap().is_empty());
    }

    #[test]
    fn test_head_not_modified() {
        let req = request(Method::HEAD, &[("If-None-Match", "\"v1\"")]);
        let (response, closed) = respond(&req);
        assert_eq!(response.outcome, Outcome::NotModified);
        assert!(response.discard_body);
        assert!(closed.load(Ordering::SeqCst));
        assert!(collect_body(response.body).unwrap().is_empty());
    }

    #[test]
    fn test_head_range_not_satisfiable() {
        let req = request(Method::HEAD, &[("Range", "bytes=100-200")]);
        let (response, closed) = respond(&req);
        assert_eq!(response.status_line(), "416 Requested Range Not Satisfiable");
        assert!(response.discard_body);
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(header_value(&response.headers, "Content-Range"), Some("bytes */10"));
        // Length of the message a GET would have received
        assert_eq!(header_value(&response.headers, "Content-Length"), Some("46"));
        assert!(collect_body(response.body).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_content_range_replaced() {
        let mut meta = meta();
        meta.headers
            .push(("Content-Range".to_string(), "bytes 0-50/10".to_string()));
        let req = request(Method::GET, &[("Range", "bytes=2-5")]);
        let (body, _) = TrackedBody::new(&[b"0123456789"]);
        let response = ConditionalResponder::default().respond(&req, meta, body);
        assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
        let ranges: Vec<_> = response
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("Content-Range"))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(ranges, ["bytes 2-5/10"]);
        assert_eq!(collect_body(response.body).unwrap(), b"2345");
    }

    #[test]
    fn test_unsafe_method_passes() {
        let req = request(Method::POST, &[("If-None-Match", "\"v1\""), ("Range", "bytes=2-5")]);
        let (response, closed) = respond(&req);
        assert_eq!(response.outcome, Outcome::Pass);
        assert!(!closed.load(Ordering::SeqCst));
        assert_eq!(collect_body(response.body).unwrap(), b"0123456789");
    }

    #[test]
    fn test_preconditions_opt_in() {
        let req = request(Method::GET, &[("If-Match", "\"v0\"")]);
        assert_eq!(ConditionalResponder::default().decide(&req, &meta()), Outcome::Pass);

        let config = ConditionalConfig {
            enforce_preconditions: true,
            ..ConditionalConfig::default()
        };
        let responder = ConditionalResponder::new(&config, &LoggingConfig::default());
        assert_eq!(responder.decide(&req, &meta()), Outcome::PreconditionFailed);

        let ok = request(Method::GET, &[("If-Match", "\"v1\""), ("Range", "bytes=0-0")]);
        assert!(matches!(responder.decide(&ok, &meta()), Outcome::Partial(_)));

        let stale = request(Method::GET, &[("If-Unmodified-Since", "Mon, 01 Jan 2024 11:00:00 GMT")]);
        let (body, closed) = TrackedBody::new(&[b"0123456789"]);
        let response = responder.respond(&stale, meta(), body);
        assert_eq!(response.status_line(), "412 Precondition Failed");
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_configured_safe_methods() {
        let config = ConditionalConfig {
            safe_methods: vec!["get".to_string(), "not a method".to_string()],
            ..ConditionalConfig::default()
        };
        let responder = ConditionalResponder::new(&config, &LoggingConfig::default());
        let head = request(Method::HEAD, &[("If-None-Match", "\"v1\"")]);
        assert_eq!(responder.decide(&head, &meta()), Outcome::Pass);
        let get = request(Method::GET, &[("If-None-Match", "\"v1\"")]);
        assert_eq!(responder.decide(&get, &meta()), Outcome::NotModified);
    }

    #[test]
    fn test_into_http_response() {
        let req = request(Method::GET, &[("Range", "bytes=2-5")]);
        let (response, _) = respond(&req);
        let http = response.into_http_response().unwrap();
        assert_eq!(http.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(http.headers()["content-range"], "bytes 2-5/10");
        assert_eq!(collect_body(http.into_body()).unwrap(), b"2345");
    }

    #[test]
    fn test_decision_entry() {
        let req = request(Method::GET, &[("Range", "bytes=100-200"), ("If-None-Match", "\"v0\"")]);
        let (response, _) = respond(&req);
        let entry = decision_entry(&req, &response);
        assert_eq!(entry.status, 416);
        assert_eq!(entry.outcome, "range_not_satisfiable");
        assert_eq!(entry.range.as_deref(), Some("bytes=100-200"));
        assert_eq!(entry.content_range.as_deref(), Some("bytes */10"));
        assert_eq!(entry.if_none_match.as_deref(), Some("\"v0\""));
        assert_eq!(entry.if_range, None);
    }
}
