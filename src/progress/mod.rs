//! Download progress accounting.
//!
//! [`ProgressTracker`] counts bytes and reports a fraction in `0.0..=1.0` to a
//! listener. [`ProgressSource`] applies it to a blocking [`ByteSource`]; the
//! async HTTP path in [`crate::remote::HttpRemote::download`] feeds it chunk
//! by chunk.
//!
//! Nothing is reported when the total length is unknown or not positive.

use std::io::{self, Cursor, Read};

pub struct ProgressTracker<L> {
    total: i64,
    read: u64,
    listener: L,
}

impl<L> ProgressTracker<L>
where
    L: FnMut(f64),
{
    /// `total` is the expected length in bytes; `-1` when unknown.
    pub fn new(total: i64, listener: L) -> Self {
        Self {
            total,
            read: 0,
            listener,
        }
    }

    /// Accounts for one read. A read of zero bytes (end of stream) adds
    /// nothing and reports nothing.
    pub fn record(&mut self, bytes: usize) {
        if bytes == 0 {
            return;
        }
        self.read = self.read.saturating_add(bytes as u64);

        if let Some(progress) = self.progress() {
            (self.listener)(progress);
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn progress(&self) -> Option<f64> {
        if self.total <= 0 {
            return None;
        }
        let fraction = self.read as f64 / self.total as f64;
        Some(fraction.clamp(0.0, 1.0))
    }
}

/// A readable body that knows its declared length and media type.
pub trait ByteSource: Read {
    /// Declared length in bytes, `-1` when unknown.
    fn content_length(&self) -> i64;
    fn content_type(&self) -> Option<&str>;
}

/// Wraps a [`ByteSource`] and reports read progress. Length and type queries
/// are answered by the inner source.
pub struct ProgressSource<S, L> {
    inner: S,
    tracker: ProgressTracker<L>,
}

impl<S, L> ProgressSource<S, L>
where
    S: ByteSource,
    L: FnMut(f64),
{
    pub fn new(inner: S, listener: L) -> Self {
        let total = inner.content_length();
        Self {
            inner,
            tracker: ProgressTracker::new(total, listener),
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.tracker.bytes_read()
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, L> Read for ProgressSource<S, L>
where
    S: ByteSource,
    L: FnMut(f64),
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.tracker.record(n);
        Ok(n)
    }
}

impl<S, L> ByteSource for ProgressSource<S, L>
where
    S: ByteSource,
    L: FnMut(f64),
{
    fn content_length(&self) -> i64 {
        self.inner.content_length()
    }

    fn content_type(&self) -> Option<&str> {
        self.inner.content_type()
    }
}

/// A body held in memory, e.g. a cached page image.
pub struct MemorySource {
    body: Cursor<Vec<u8>>,
    content_length: i64,
    content_type: Option<String>,
}

impl MemorySource {
    pub fn new(body: Vec<u8>, content_type: Option<String>) -> Self {
        let content_length = body.len() as i64;
        Self {
            body: Cursor::new(body),
            content_length,
            content_type,
        }
    }

    /// Overrides the declared length, as a server response header might.
    pub fn with_declared_length(mut self, content_length: i64) -> Self {
        self.content_length = content_length;
        self
    }
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

impl ByteSource for MemorySource {
    fn content_length(&self) -> i64 {
        self.content_length
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}
