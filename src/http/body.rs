//! Response body module
//!
//! A body is a pull-based iterator of byte chunks that can be closed
//! without being drained. Nothing here seeks or assumes a length.

use std::collections::VecDeque;

use hyper::body::Bytes;

use crate::error::BodyError;

/// Closeable chunk iterator
pub trait Body: Iterator<Item = Result<Bytes, BodyError>> {
    /// Release the underlying source; no chunks follow
    fn close(&mut self) {}
}

impl<B: Body + ?Sized> Body for Box<B> {
    fn close(&mut self) {
        (**self).close();
    }
}

pub type BoxBody = Box<dyn Body>;

/// In-memory body made of pre-split chunks
#[derive(Debug, Default)]
pub struct ChunkedBody {
    chunks: VecDeque<Bytes>,
    closed: bool,
}

impl ChunkedBody {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            closed: false,
        }
    }

    pub fn single(data: impl Into<Bytes>) -> Self {
        Self::new([data.into()])
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Iterator for ChunkedBody {
    type Item = Result<Bytes, BodyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.chunks.pop_front().map(Ok)
    }
}

impl Body for ChunkedBody {
    fn close(&mut self) {
        self.closed = true;
        self.chunks.clear();
    }
}

/// Wraps any chunk iterator; closing drops it
#[derive(Debug)]
pub struct IterBody<I> {
    inner: Option<I>,
}

impl<I> IterBody<I> {
    pub const fn new(inner: I) -> Self {
        Self { inner: Some(inner) }
    }
}

impl<I> Iterator for IterBody<I>
where
    I: Iterator<Item = Result<Bytes, BodyError>>,
{
    type Item = Result<Bytes, BodyError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }
}

impl<I> Body for IterBody<I>
where
    I: Iterator<Item = Result<Bytes, BodyError>>,
{
    fn close(&mut self) {
        self.inner = None;
    }
}

/// Body with no chunks
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyBody;

impl Iterator for EmptyBody {
    type Item = Result<Bytes, BodyError>;

    fn next(&mut self) -> Option<Self::Item> {
        None
    }
}

impl Body for EmptyBody {}

/// Drain a body into one buffer, closing it afterwards
pub fn collect_body<B: Body>(mut body: B) -> Result<Vec<u8>, BodyError> {
    let mut out = Vec::new();
    let result = body.by_ref().try_for_each(|chunk| {
        out.extend_from_slice(&chunk?);
        Ok(())
    });
    body.close();
    result.map(|()| out)
}
