//! Request types for strata

use crate::shift::shift_path;
use bytes::Bytes;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri, Version};

/// HTTP Request wrapper
///
/// Provides access to all parts of an incoming HTTP request plus a routing
/// path that [`Request::shift_path`] consumes segment by segment. The URI
/// itself is never rewritten, so loggers always see the path the client sent.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Bytes,
    route_path: String,
}

impl Request {
    /// Create a new request from parts and a fully buffered body
    pub fn new(parts: Parts, body: Bytes) -> Self {
        let route_path = parts.uri.path().to_owned();
        Self {
            parts,
            body,
            route_path,
        }
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI as received
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get mutable headers
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Get request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Get mutable extensions
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// Get the routing path
    ///
    /// Starts out as the URI path and shrinks every time
    /// [`shift_path`](Request::shift_path) is called.
    pub fn path(&self) -> &str {
        &self.route_path
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Get the body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Pop the first segment of the routing path
    ///
    /// The routing path becomes the remaining tail:
    ///
    /// ```rust,ignore
    /// // GET /api/v1/hello
    /// assert_eq!(req.shift_path(), "api");
    /// assert_eq!(req.path(), "/v1/hello");
    /// ```
    pub fn shift_path(&mut self) -> String {
        let (head, tail) = shift_path(&self.route_path);
        self.route_path = tail;
        head
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .field("path", &self.route_path)
            .finish()
    }
}
