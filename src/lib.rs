//! HTTP content negotiation and conditional responses
//!
//! Parses `Accept*`, `Range`, `If-*` request headers, decides between 200,
//! 304, 206 and 416 for a response, and slices or gzips response bodies
//! lazily as they are pulled.
//!
//! ```
//! use hyper::{Method, StatusCode};
//! use yarhs_conditional::http::{ChunkedBody, ConditionalRequest, ConditionalResponder, ResponseMeta};
//! use yarhs_conditional::http::body::collect_body;
//!
//! let req = ConditionalRequest::from_headers(
//!     Method::GET,
//!     &[("Range".to_string(), "bytes=2-5".to_string())],
//! );
//! let meta = ResponseMeta::new(
//!     StatusCode::OK,
//!     vec![("Content-Length".to_string(), "10".to_string())],
//! );
//! let response = ConditionalResponder::default().respond(&req, meta, ChunkedBody::single(&b"0123456789"[..]));
//! assert_eq!(response.status_line(), "206 Partial Content");
//! assert_eq!(collect_body(response.body).unwrap(), b"2345");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logger;

pub use config::Config;
pub use error::{BodyError, Error, Result};
