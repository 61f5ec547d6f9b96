//! Middleware infrastructure for strata
//!
//! A [`Middleware`] wraps the next handler of a chain and returns a new
//! handler. It decides whether and when `next` runs, so it can act before
//! and after the rest of the chain (timing, logging) or stop it entirely.
//!
//! Plain steps that only need to run *before* the rest of the chain are
//! registered through [`Router::add`](crate::Router::add), which wraps them in
//! a [`Step`]: the step runs, and `next` runs only if the step succeeded.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_core::{handler_fn, middleware_fn, BoxedHandler, Router};
//!
//! let mut router = Router::<AppContext>::new();
//! router.use_middleware(RequestLogger::new(LoggingOptions::default()));
//! router.add_fn(|_cx, hcx, _w, req| Box::pin(async move {
//!     hcx.user = fetch_user(req).await?;
//!     Ok(())
//! }));
//! ```

mod logging;

pub use logging::{LogCheck, LogLevel, LoggingOptions, RequestLogger};

use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::ResponseWriter;
use std::sync::Arc;

/// A type-erased middleware shared between routers
pub type BoxedMiddleware<C> = Arc<dyn Middleware<C>>;

/// Trait for types that wrap a handler into another handler
///
/// Wrapping happens once, when a [`Router`](crate::Router) builds its
/// handler. Per-request side effects belong inside the returned handler.
pub trait Middleware<C>: Send + Sync + 'static {
    /// Wrap `next`, producing the handler that runs in its place
    fn wrap(&self, next: BoxedHandler<C>) -> BoxedHandler<C>;

    /// Erase the concrete middleware type
    fn boxed(self) -> BoxedMiddleware<C>
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

impl<C, M> Middleware<C> for Arc<M>
where
    M: Middleware<C> + ?Sized,
{
    fn wrap(&self, next: BoxedHandler<C>) -> BoxedHandler<C> {
        (**self).wrap(next)
    }
}

/// A [`Middleware`] backed by a closure
///
/// Built with [`middleware_fn`].
#[derive(Clone)]
pub struct MiddlewareFn<F> {
    f: F,
}

/// Create a [`Middleware`] from a closure taking the next handler
pub fn middleware_fn<C, F>(f: F) -> MiddlewareFn<F>
where
    F: Fn(BoxedHandler<C>) -> BoxedHandler<C> + Send + Sync + 'static,
{
    MiddlewareFn { f }
}

impl<C, F> Middleware<C> for MiddlewareFn<F>
where
    F: Fn(BoxedHandler<C>) -> BoxedHandler<C> + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler<C>) -> BoxedHandler<C> {
        (self.f)(next)
    }
}

/// Runs a handler, then the rest of the chain if it succeeded
pub struct Step<C> {
    handler: BoxedHandler<C>,
}

impl<C> Step<C> {
    pub fn new(handler: BoxedHandler<C>) -> Self {
        Self { handler }
    }
}

impl<C> Clone for Step<C> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<C: Send + 'static> Middleware<C> for Step<C> {
    fn wrap(&self, next: BoxedHandler<C>) -> BoxedHandler<C> {
        Arc::new(StepHandler {
            step: self.handler.clone(),
            next,
        })
    }
}

struct StepHandler<C> {
    step: BoxedHandler<C>,
    next: BoxedHandler<C>,
}

impl<C: Send + 'static> Handler<C> for StepHandler<C> {
    fn handle<'a>(
        &'a self,
        cx: &'a Context,
        hcx: &'a mut C,
        w: &'a mut dyn ResponseWriter,
        req: &'a mut Request,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.step.handle(cx, hcx, w, req).await?;
            self.next.handle(cx, hcx, w, req).await
        })
    }
}
