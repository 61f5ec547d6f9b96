use strata_core::BoxError;
use thiserror::Error;

/// Session error type
#[derive(Debug, Error)]
pub enum SessionError {
    /// The cookie value is not a valid session id
    #[error("invalid session id: {0}")]
    InvalidId(String),

    /// The store failed to look the session up
    #[error("session store error: {0}")]
    Store(#[source] BoxError),

    /// The session cookie could not be encoded as a header
    #[error("invalid session cookie: {0}")]
    InvalidCookie(#[from] http::header::InvalidHeaderValue),

    /// Error raised by strata itself, such as an elapsed deadline
    #[error(transparent)]
    Core(#[from] strata_core::Error),
}

impl SessionError {
    /// Wrap a store specific error
    pub fn store<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Store(err.into())
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
