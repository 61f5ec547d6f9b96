//! Pass-through response sink recording status and body size

use crate::error::Result;
use crate::response::{Hijacker, ResponseWriter};
use http::{HeaderMap, StatusCode};
use hyper::upgrade::OnUpgrade;
use std::io;

/// Wraps a [`ResponseWriter`] and records what is written through it
///
/// Every call is forwarded unchanged. The observer remembers the last status
/// it was told about, whether or not the underlying sink honoured it, and the
/// total number of body bytes handed to [`write`](ResponseWriter::write).
pub struct ResponseObserver<'w> {
    inner: &'w mut dyn ResponseWriter,
    status: Option<StatusCode>,
    size: usize,
}

impl<'w> ResponseObserver<'w> {
    pub fn new(inner: &'w mut dyn ResponseWriter) -> Self {
        Self {
            inner,
            status: None,
            size: 0,
        }
    }

    /// Last status passed to `write_header`, `None` if it was never called
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Cumulative number of body bytes written
    pub fn size(&self) -> usize {
        self.size
    }
}

impl ResponseWriter for ResponseObserver<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.inner.write_header(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.size += buf.len();
        self.inner.write(buf)
    }

    /// Always `Some`, whatever the wrapped sink supports
    ///
    /// Behind an observer the capability query cannot tell whether an upgrade
    /// is possible: [`hijack`](Hijacker::hijack) panics when the wrapped sink
    /// has no hijack capability.
    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        Some(self)
    }
}

impl Hijacker for ResponseObserver<'_> {
    /// Forward to the wrapped sink
    ///
    /// # Panics
    ///
    /// Panics if the wrapped sink has no hijack capability.
    fn hijack(&mut self) -> Result<OnUpgrade> {
        match self.inner.hijacker() {
            Some(hijacker) => hijacker.hijack(),
            None => panic!("response writer does not support hijacking"),
        }
    }
}
