//! HTTP protocol layer module
//!
//! Header parsing, negotiation, conditional decisions and body transforms.
//! Nothing in here does I/O; bodies are pulled by whoever sends them.

pub mod accept;
pub mod body;
pub mod conditional;
pub mod content_range;
pub mod date;
pub mod etag;
pub mod gzip;
pub mod headers;
pub mod if_range;
pub mod mime;
pub mod quality;
pub mod range;
pub mod response;
pub mod slicer;

// Re-export commonly used types
pub use accept::{Accept, AcceptKind, OfferSpec};
pub use body::{Body, BoxBody, ChunkedBody, EmptyBody, IterBody};
pub use conditional::{ConditionalResponder, ConditionalResponse, Outcome};
pub use content_range::ContentRange;
pub use etag::{ETag, EntityTag, Strength};
pub use gzip::{encode_response, negotiate_coding, ContentCoding, GzipEncoder};
pub use headers::{ConditionalRequest, HeaderList, ResponseMeta};
pub use if_range::IfRange;
pub use range::ByteRange;
pub use slicer::StreamSlicer;
