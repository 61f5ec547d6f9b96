//! # strata-core
//!
//! Building blocks for composing HTTP handlers out of small fallible steps.
//!
//! - [`Handler`]: an async step receiving a [`Context`], a caller-defined
//!   handler context `C`, a [`ResponseWriter`] and the [`Request`]. Returning
//!   an [`Error`] stops the chain.
//! - [`Router`]: an ordered stack of steps and [`Middleware`]s, composed into
//!   one handler. [`Router::diverge`] forks a stack so routes can share a
//!   common prefix.
//! - [`ResponseObserver`]: a pass-through sink recording the status and body
//!   size, used by the [`RequestLogger`].
//! - [`shift_path`]: splits a path into its first segment and the rest, for
//!   hand-written routing.
//! - [`Adapter`] and [`serve`]: run a composed handler on hyper.
//!
//! Most users depend on the `strata` facade crate instead.

mod adapter;
mod config;
mod context;
mod error;
mod handler;
pub mod helpers;
pub mod middleware;
mod observer;
mod request;
mod response;
mod router;
mod server;
mod shift;

// Public API
pub use adapter::{Adapter, AdapterConfig, ContextFactory};
pub use config::ConfigError;
pub use context::Context;
pub use error::{BoxError, Error, Result};
pub use handler::{handler_fn, BoxFuture, BoxedHandler, Handler, HandlerFn};
pub use helpers::{
    write_bad_request, write_error, write_fmt, write_ok, write_service_unavailable, write_text,
    write_unauthorized,
};
pub use middleware::{
    middleware_fn, BoxedMiddleware, LogLevel, LoggingOptions, Middleware, MiddlewareFn,
    RequestLogger, Step,
};
pub use observer::ResponseObserver;
pub use request::Request;
pub use response::{BufferedResponse, Hijacker, Response, ResponseWriter};
pub use router::Router;
pub use server::{serve, serve_listener};
pub use shift::shift_path;
