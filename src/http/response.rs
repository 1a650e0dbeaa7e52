//! HTTP response building module
//!
//! Header and status builders for each conditional outcome, plus conversion
//! of a finished response into a `hyper::Response`.

use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::content_range::ContentRange;
use super::headers::{filter_headers, HeaderList};
use super::range::ByteRange;
use crate::error::Result;

/// Headers that describe the original body and must not survive a rewrite
const BODY_HEADERS: [&str; 2] = ["Content-Length", "Content-Type"];

/// Status line text, e.g. `"206 Partial Content"`
pub fn status_line(status: StatusCode) -> String {
    let reason = match status.as_u16() {
        416 => "Requested Range Not Satisfiable",
        _ => status.canonical_reason().unwrap_or("Unknown"),
    };
    format!("{} {reason}", status.as_u16())
}

/// Build 304 Not Modified headers
pub fn build_304_headers(original: &[(String, String)]) -> HeaderList {
    filter_headers(original, &BODY_HEADERS)
}

/// Build 412 Precondition Failed headers
pub fn build_412_headers(original: &[(String, String)]) -> HeaderList {
    filter_headers(original, &BODY_HEADERS)
}

/// Build 416 Range Not Satisfiable headers and body
///
/// The explanatory headers come first, followed by the original ones minus
/// those describing the original body.
pub fn build_416_response(
    range: &ByteRange,
    length: u64,
    original: &[(String, String)],
) -> (HeaderList, Bytes) {
    let body = format!("Requested range not satisfiable: {range}");
    let mut headers = vec![
        ("Content-Length".to_string(), body.len().to_string()),
        ("Content-Range".to_string(), ContentRange::unsatisfied(length).to_string()),
        ("Content-Type".to_string(), "text/plain".to_string()),
    ];
    headers.extend(filter_headers(original, &BODY_HEADERS));
    (headers, Bytes::from(body))
}

/// Build 206 Partial Content headers
///
/// `Content-Type` is kept. The original length and any stale
/// `Content-Range` are replaced.
pub fn build_206_headers(content_range: &ContentRange, original: &[(String, String)]) -> HeaderList {
    let mut headers = Vec::with_capacity(original.len() + 2);
    if let Some(len) = content_range.len() {
        headers.push(("Content-Length".to_string(), len.to_string()));
    }
    headers.push(("Content-Range".to_string(), content_range.to_string()));
    headers.extend(filter_headers(original, &["Content-Length", "Content-Range"]));
    headers
}

/// Turn status, headers and body into a `hyper::Response`
///
/// # Errors
/// Fails when a header name or value is not valid HTTP.
pub fn build_http_response<B>(status: StatusCode, headers: &[(String, String)], body: B) -> Result<Response<B>> {
    let mut builder = Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(body).map_err(|e| {
        log_build_error(status, &e);
        e.into()
    })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {} response: {error}", status.as_u16()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::headers::header_value;

    fn original() -> HeaderList {
        vec![
            ("Content-Type".to_string(), "text/plain".to_string()),
            ("Content-Length".to_string(), "10".to_string()),
            ("ETag".to_string(), "\"v1\"".to_string()),
        ]
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(status_line(StatusCode::OK), "200 OK");
        assert_eq!(status_line(StatusCode::NOT_MODIFIED), "304 Not Modified");
        assert_eq!(status_line(StatusCode::PARTIAL_CONTENT), "206 Partial Content");
        assert_eq!(
            status_line(StatusCode::RANGE_NOT_SATISFIABLE),
            "416 Requested Range Not Satisfiable"
        );
        assert_eq!(status_line(StatusCode::PRECONDITION_FAILED), "412 Precondition Failed");
    }

    #[test]
    fn test_304_drops_body_headers() {
        let headers = build_304_headers(&original());
        assert_eq!(headers, vec![("ETag".to_string(), "\"v1\"".to_string())]);
    }

    #[test]
    fn test_416_response() {
        let range = ByteRange::parse("bytes=100-200").unwrap();
        let (headers, body) = build_416_response(&range, 10, &original());
        assert_eq!(&body[..], b"Requested range not satisfiable: bytes=100-200");
        assert_eq!(headers[0], ("Content-Length".to_string(), "46".to_string()));
        assert_eq!(headers[1], ("Content-Range".to_string(), "bytes */10".to_string()));
        assert_eq!(header_value(&headers, "Content-Type"), Some("text/plain"));
        assert_eq!(header_value(&headers, "Content-Length"), Some("46"));
        assert_eq!(header_value(&headers, "ETag"), Some("\"v1\""));
        assert_eq!(headers.len(), 4);
    }

    #[test]
    fn test_206_headers() {
        let content_range = ContentRange::new(Some(2), Some(6), Some(10)).unwrap();
        let headers = build_206_headers(&content_range, &original());
        assert_eq!(header_value(&headers, "Content-Length"), Some("4"));
        assert_eq!(header_value(&headers, "Content-Range"), Some("bytes 2-5/10"));
        assert_eq!(header_value(&headers, "Content-Type"), Some("text/plain"));
        assert_eq!(headers.iter().filter(|(n, _)| n == "Content-Length").count(), 1);
        assert_eq!(headers[0].0, "Content-Length");
        assert_eq!(headers[1].0, "Content-Range");
    }

    #[test]
    fn test_206_replaces_stale_content_range() {
        let mut stale = original();
        stale.push(("content-range".to_string(), "bytes 0-50/10".to_string()));
        let content_range = ContentRange::new(Some(2), Some(6), Some(10)).unwrap();
        let headers = build_206_headers(&content_range, &stale);
        let ranges: Vec<_> = headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("Content-Range"))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(ranges, ["bytes 2-5/10"]);
    }

    #[test]
    fn test_build_http_response() {
        let response = build_http_response(StatusCode::PARTIAL_CONTENT, &original(), ()).unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()["etag"], "\"v1\"");

        let bad = vec![("Bad Header".to_string(), "x".to_string())];
        assert!(build_http_response(StatusCode::OK, &bad, ()).is_err());
    }
}
