//! Gzip content coding module
//!
//! Streaming gzip encoding of a body plus whole-buffer gzip and deflate
//! decoding. The encoder writes the gzip framing itself around a raw
//! DEFLATE stream so chunks can be produced as the body is pulled.

use std::fmt;
use std::io::Read;

use crc32fast::Hasher;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::{Compress, Compression, FlushCompress, Status};
use hyper::body::Bytes;

use super::accept::Accept;
use super::body::{collect_body, Body, BoxBody, ChunkedBody};
use super::headers::{header_value, HeaderList};
use crate::config::GzipConfig;
use crate::error::{BodyError, Error, Result};

/// Fixed gzip header: magic, deflate, no flags, no mtime, max compression, unknown OS
pub const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0xff];

const OUTPUT_CHUNK: usize = 16 * 1024;

/// Content codings this crate can produce or undo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Identity,
    Gzip,
    Deflate,
}

impl ContentCoding {
    /// Parse a `Content-Encoding` token
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("identity") {
            return Some(Self::Identity);
        }
        if value.eq_ignore_ascii_case("gzip") || value.eq_ignore_ascii_case("x-gzip") {
            return Some(Self::Gzip);
        }
        if value.eq_ignore_ascii_case("deflate") {
            return Some(Self::Deflate);
        }
        None
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }
}

impl fmt::Display for ContentCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the coding for a response from an `Accept-Encoding` negotiator
///
/// Only gzip is produced; identity wins ties, and is also the answer when
/// the client refuses both.
pub fn negotiate_coding(accept_encoding: &Accept) -> ContentCoding {
    match accept_encoding.best_match([("identity", 1.0), ("gzip", 1.0)], Some("identity")) {
        Ok(Some(coding)) if coding == "gzip" => ContentCoding::Gzip,
        _ => ContentCoding::Identity,
    }
}

enum Stage {
    Header,
    Body,
    Trailer,
    Done,
}

/// Gzip-encodes a body while it is pulled
///
/// Yields the header first, then whatever the compressor produces per input
/// chunk (empty outputs are skipped), then the flushed tail and the
/// `crc32 || size` trailer.
pub struct GzipEncoder<B> {
    inner: B,
    compress: Compress,
    crc: Hasher,
    size: u32,
    stage: Stage,
}

impl<B: Body> GzipEncoder<B> {
    pub fn new(inner: B, level: u32) -> Self {
        Self {
            inner,
            compress: Compress::new(Compression::new(level.min(9)), false),
            crc: Hasher::new(),
            size: 0,
            stage: Stage::Header,
        }
    }

    fn deflate(&mut self, input: &[u8], flush: FlushCompress) -> Result<Vec<u8>, BodyError> {
        let mut out = Vec::with_capacity(OUTPUT_CHUNK);
        let mut consumed = 0;
        loop {
            if out.len() == out.capacity() {
                out.reserve(OUTPUT_CHUNK);
            }
            let before = self.compress.total_in();
            let status = self.compress.compress_vec(&input[consumed..], &mut out, flush)?;
            consumed += usize::try_from(self.compress.total_in() - before).unwrap_or(input.len());

            let finished = match flush {
                FlushCompress::Finish => status == Status::StreamEnd,
                _ => consumed >= input.len() && out.len() < out.capacity(),
            };
            if finished {
                return Ok(out);
            }
        }
    }

    fn trailer(&self) -> Bytes {
        let mut trailer = Vec::with_capacity(8);
        trailer.extend_from_slice(&self.crc.clone().finalize().to_le_bytes());
        trailer.extend_from_slice(&self.size.to_le_bytes());
        Bytes::from(trailer)
    }
}

impl<B: Body> Iterator for GzipEncoder<B> {
    type Item = Result<Bytes, BodyError>;

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stage {
                Stage::Header => {
                    self.stage = Stage::Body;
                    return Some(Ok(Bytes::from_static(&GZIP_HEADER)));
                }
                Stage::Body => match self.inner.next() {
                    Some(Ok(chunk)) => {
                        self.crc.update(&chunk);
                        // Size is kept mod 2^32
                        self.size = self.size.wrapping_add(chunk.len() as u32);
                        match self.deflate(&chunk, FlushCompress::None) {
                            Ok(out) if out.is_empty() => continue,
                            Ok(out) => return Some(Ok(Bytes::from(out))),
                            Err(e) => {
                                self.stage = Stage::Done;
                                return Some(Err(e));
                            }
                        }
                    }
                    Some(Err(e)) => {
                        self.stage = Stage::Done;
                        return Some(Err(e));
                    }
                    None => {
                        self.stage = Stage::Trailer;
                        match self.deflate(&[], FlushCompress::Finish) {
                            Ok(out) if out.is_empty() => continue,
                            Ok(out) => return Some(Ok(Bytes::from(out))),
                            Err(e) => {
                                self.stage = Stage::Done;
                                return Some(Err(e));
                            }
                        }
                    }
                },
                Stage::Trailer => {
                    self.stage = Stage::Done;
                    return Some(Ok(self.trailer()));
                }
                Stage::Done => return None,
            }
        }
    }
}

impl<B: Body> Body for GzipEncoder<B> {
    fn close(&mut self) {
        self.stage = Stage::Done;
        self.inner.close();
    }
}

/// Gzip a response body when the client accepts it
///
/// Bodies already carrying a coding, or with a known length under
/// `min_length`, are returned untouched. Otherwise `Content-Length` is
/// dropped and `Content-Encoding` / `Vary` are set.
pub fn encode_response<B: Body + 'static>(
    accept_encoding: &Accept,
    headers: &mut HeaderList,
    body: B,
    config: &GzipConfig,
) -> BoxBody {
    let already_encoded = header_value(headers, "Content-Encoding")
        .is_some_and(|v| ContentCoding::parse(v) != Some(ContentCoding::Identity));
    let too_short = header_value(headers, "Content-Length")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|len| len < config.min_length);
    if already_encoded || too_short || negotiate_coding(accept_encoding) != ContentCoding::Gzip {
        return Box::new(body);
    }

    headers.retain(|(n, _)| {
        !n.eq_ignore_ascii_case("Content-Length") && !n.eq_ignore_ascii_case("Content-Encoding")
    });
    headers.push(("Content-Encoding".to_string(), ContentCoding::Gzip.to_string()));
    let varies = header_value(headers, "Vary").is_some_and(|v| {
        v.split(',')
            .any(|f| f.trim() == "*" || f.trim().eq_ignore_ascii_case("Accept-Encoding"))
    });
    if !varies {
        headers.push(("Vary".to_string(), "Accept-Encoding".to_string()));
    }
    Box::new(GzipEncoder::new(body, config.level))
}

/// Gzip a whole buffer
///
/// # Examples
/// ```
/// use yarhs_conditional::http::gzip::{decode_gzip, encode_gzip};
///
/// let encoded = encode_gzip(b"hello world", 9).unwrap();
/// assert_eq!(decode_gzip(&encoded).unwrap(), b"hello world");
/// ```
pub fn encode_gzip(data: &[u8], level: u32) -> Result<Vec<u8>, BodyError> {
    let body = ChunkedBody::single(Bytes::copy_from_slice(data));
    collect_body(GzipEncoder::new(body, level))
}

/// Unwrap a gzip stream
pub fn decode_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Undo `deflate`: zlib-wrapped data first, raw DEFLATE as a fallback
pub fn decode_deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    if ZlibDecoder::new(data).read_to_end(&mut out).is_ok() {
        return Ok(out);
    }
    out.clear();
    DeflateDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Decode a buffer carrying the given content coding
pub fn decode(data: &[u8], coding: ContentCoding) -> Result<Vec<u8>> {
    match coding {
        ContentCoding::Identity => Ok(data.to_vec()),
        ContentCoding::Gzip => decode_gzip(data),
        ContentCoding::Deflate => decode_deflate(data),
    }
}

/// Decode by `Content-Encoding` header value
pub fn decode_content(data: &[u8], content_encoding: &str) -> Result<Vec<u8>> {
    let coding = ContentCoding::parse(content_encoding)
        .ok_or_else(|| Error::UnsupportedCoding(content_encoding.to_string()))?;
    decode(data, coding)
}
