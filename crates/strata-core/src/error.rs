//! Error types for strata
//!
//! Handlers return [`Error`] to stop the chain. The error carries an optional
//! HTTP status which the outermost adapter uses when it turns the failure into
//! a response.

use http::StatusCode;
use thiserror::Error;

/// Boxed error type accepted by [`Error::new`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for strata operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned by a [`Handler`](crate::Handler) to short-circuit the chain
#[derive(Debug, Error)]
pub enum Error {
    /// A failure that maps to a specific HTTP status
    #[error("{message}")]
    Status {
        /// Status the adapter should respond with
        status: StatusCode,
        /// Human-readable message, also used as the response body
        message: String,
    },

    /// The request [`Context`](crate::Context) deadline elapsed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// I/O failure while writing the response
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Any other error produced by a handler
    #[error(transparent)]
    Other(BoxError),
}

impl Error {
    /// Wrap an arbitrary error
    pub fn new<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Other(err.into())
    }

    /// Create an error from a message, reported as `500 Internal Server Error`
    pub fn msg(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Create an error that maps to `status`
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, message)
    }

    /// Create a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, message)
    }

    /// The status an adapter should respond with for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Status { status, .. } => *status,
            Self::DeadlineExceeded => StatusCode::SERVICE_UNAVAILABLE,
            Self::Io(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Downcast the wrapped error of an [`Error::Other`]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Other(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns true if this error is an [`Error::Other`] wrapping an `E`
    pub fn is<E>(&self) -> bool
    where
        E: std::error::Error + 'static,
    {
        self.downcast_ref::<E>().is_some()
    }
}
