//! Error types
//!
//! Wire input never produces an error here: malformed headers degrade to
//! "no constraint". Errors are reserved for caller bugs, broken bodies and
//! configuration problems.

use std::io;

use thiserror::Error;

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    /// An offer passed to a negotiator contained a `*` wildcard
    #[error("offers must be specific values, got {0:?}")]
    WildcardOffer(String),
    /// A `ContentRange` was built from inconsistent values
    #[error("bad content range {start:?}-{stop:?}/{length:?}")]
    InvalidContentRange {
        start: Option<u64>,
        stop: Option<u64>,
        length: Option<u64>,
    },
    #[error("unsupported content coding: {0}")]
    UnsupportedCoding(String),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("config serialization error: {0}")]
    ConfigDump(#[from] toml::ser::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to build response: {0}")]
    Http(#[from] hyper::http::Error),
}

/// Errors raised while pulling a response body
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body ended before the first byte of the requested range
    #[error("body disconnected at byte {position}, range starts at {start}")]
    Disconnected { position: u64, start: u64 },
    #[error("compression failed: {0}")]
    Compress(#[from] flate2::CompressError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
