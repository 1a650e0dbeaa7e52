//! Byte range slicing module
//!
//! Trims a body to `[start, stop)` while pulling it, one chunk at a time.

use hyper::body::Bytes;

use super::body::Body;
use crate::error::BodyError;

/// Lazily yields bytes `[start, stop)` of the wrapped body
///
/// Chunks entirely before `start` are pulled and dropped. Running out of
/// chunks before `start` is reported as [`BodyError::Disconnected`], since
/// it means the body is shorter than its advertised length.
#[derive(Debug)]
pub struct StreamSlicer<B> {
    inner: B,
    position: u64,
    start: u64,
    stop: u64,
    done: bool,
}

impl<B: Body> StreamSlicer<B> {
    pub const fn new(inner: B, start: u64, stop: u64) -> Self {
        Self {
            inner,
            position: 0,
            start,
            stop,
            done: false,
        }
    }

    /// Bytes pulled from the wrapped body so far
    pub const fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> B {
        self.inner
    }

    fn fail(&mut self, err: BodyError) -> Option<Result<Bytes, BodyError>> {
        self.done = true;
        Some(Err(err))
    }

    /// Cut the tail off a chunk that crosses `stop`
    fn finish_chunk(&mut self, mut chunk: Bytes, chunk_start: u64) -> Bytes {
        if self.position >= self.stop {
            self.done = true;
            chunk.truncate(to_offset(self.stop.saturating_sub(chunk_start)));
        }
        chunk
    }

    fn skip_to_start(&mut self) -> Option<Result<Bytes, BodyError>> {
        while self.position < self.start {
            let chunk = match self.inner.next() {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return self.fail(e),
                None => {
                    let err = BodyError::Disconnected {
                        position: self.position,
                        start: self.start,
                    };
                    return self.fail(err);
                }
            };
            let chunk_start = self.position;
            self.position += chunk.len() as u64;
            if self.position > self.start {
                let head = chunk.slice(to_offset(self.start - chunk_start)..);
                let head = self.finish_chunk(head, self.start);
                return Some(Ok(head));
            }
        }
        None
    }
}

fn to_offset(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

impl<B: Body> Iterator for StreamSlicer<B> {
    type Item = Result<Bytes, BodyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.position < self.start {
            if let Some(item) = self.skip_to_start() {
                return Some(item);
            }
        }
        if self.position >= self.stop {
            self.done = true;
            return None;
        }

        loop {
            match self.inner.next() {
                Some(Ok(chunk)) if chunk.is_empty() => continue,
                Some(Ok(chunk)) => {
                    let chunk_start = self.position;
                    self.position += chunk.len() as u64;
                    return Some(Ok(self.finish_chunk(chunk, chunk_start)));
                }
                Some(Err(e)) => return self.fail(e),
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

impl<B: Body> Body for StreamSlicer<B> {
    fn close(&mut self) {
        self.done = true;
        self.inner.close();
    }
}
