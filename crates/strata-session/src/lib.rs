//! # strata-session
//!
//! Middleware attaching a session, looked up from a cookie, to each request.
//!
//! Implement [`Store`] for your session backend (or use [`MemoryStore`] in
//! tests), register a [`SessionLayer`] in a strata `Router`, and read the
//! session in later steps with [`Session::from_request`].

mod error;
mod layer;
mod store;

pub use error::{Result, SessionError};
pub use layer::{IdExtractor, Session, SessionLayer, SessionOptions, SessionValue};
pub use store::{MemoryStore, Store};
