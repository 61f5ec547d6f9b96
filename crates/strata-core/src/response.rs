//! Response sink abstraction
//!
//! Handlers never build a response value; they write into a
//! [`ResponseWriter`]. This keeps wrappers such as the
//! [`ResponseObserver`](crate::ResponseObserver) transparent: they delegate
//! every call and record what went through.
//!
//! [`BufferedResponse`] is the in-memory sink used by the hyper adapter and by
//! tests.

use crate::error::{Error, Result};
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use hyper::upgrade::OnUpgrade;
use std::io;

/// HTTP Response type produced by [`BufferedResponse::into_response`]
pub type Response = http::Response<Full<Bytes>>;

/// Outbound response sink
pub trait ResponseWriter: Send {
    /// Response headers
    fn headers(&self) -> &HeaderMap;

    /// Mutable response headers, only meaningful before the status is sent
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Send the response status
    fn write_header(&mut self, status: StatusCode);

    /// Append `buf` to the response body
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Connection takeover capability
    ///
    /// `None` means the sink cannot hand out the underlying connection.
    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        None
    }
}

/// Capability to take over the underlying connection (protocol upgrade)
pub trait Hijacker: Send {
    /// Take the pending upgrade of the connection
    ///
    /// The handler must send `101 Switching Protocols` for the upgrade future
    /// to resolve.
    fn hijack(&mut self) -> Result<OnUpgrade>;
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        (**self).write_header(status)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        (**self).hijacker()
    }
}

/// In-memory response sink
///
/// The first call to [`write_header`](ResponseWriter::write_header) wins;
/// later calls are ignored. Writing the body without sending a status first
/// implies `200 OK`.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
    upgrade: Option<OnUpgrade>,
}

impl BufferedResponse {
    /// Create an empty response sink without hijack capability
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a response sink that can hand out `upgrade` through
    /// [`Hijacker::hijack`]
    pub fn with_upgrade(upgrade: OnUpgrade) -> Self {
        Self {
            upgrade: Some(upgrade),
            ..Self::default()
        }
    }

    /// The status sent so far, if any
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The body written so far
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into an HTTP response, defaulting to `200 OK`
    pub fn into_response(self) -> Response {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => {
                tracing::debug!(
                    current = current.as_u16(),
                    ignored = status.as_u16(),
                    "superfluous write_header call"
                );
            }
            None => self.status = Some(status),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn hijacker(&mut self) -> Option<&mut dyn Hijacker> {
        if self.upgrade.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl Hijacker for BufferedResponse {
    fn hijack(&mut self) -> Result<OnUpgrade> {
        self.upgrade
            .take()
            .ok_or_else(|| Error::msg("connection already hijacked"))
    }
}
