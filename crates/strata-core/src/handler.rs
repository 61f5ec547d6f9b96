//! Handler trait and utilities
//!
//! A [`Handler`] is the unit of work of a chain. Unlike a plain HTTP service
//! it can fail, and it receives two extra arguments:
//!
//! - a [`Context`] carrying the request deadline,
//! - a mutable borrow of a caller-defined handler context `C`, built once per
//!   request, that steps use to hand values (a user, a rate limiter, a
//!   database handle...) to the steps after them.
//!
//! Handlers are stored type-erased as [`BoxedHandler`] so middleware can wrap
//! them without knowing their concrete type.

use crate::context::Context;
use crate::error::Result;
use crate::request::Request;
use crate::response::ResponseWriter;
use std::sync::Arc;

/// A heap-allocated, type-erased future borrowing from its handler call
pub use futures_util::future::BoxFuture;

/// A type-erased handler shared across concurrent requests
pub type BoxedHandler<C> = Arc<dyn Handler<C>>;

/// Trait representing a fallible async request handler
///
/// Returning `Err` stops the chain: no later step runs and the error bubbles
/// up to whoever invoked the composed handler.
pub trait Handler<C>: Send + Sync + 'static {
    /// Process one request
    fn handle<'a>(
        &'a self,
        cx: &'a Context,
        hcx: &'a mut C,
        w: &'a mut dyn ResponseWriter,
        req: &'a mut Request,
    ) -> BoxFuture<'a, Result<()>>;

    /// Erase the concrete handler type
    fn boxed(self) -> BoxedHandler<C>
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

impl<C, H> Handler<C> for Arc<H>
where
    H: Handler<C> + ?Sized,
{
    fn handle<'a>(
        &'a self,
        cx: &'a Context,
        hcx: &'a mut C,
        w: &'a mut dyn ResponseWriter,
        req: &'a mut Request,
    ) -> BoxFuture<'a, Result<()>> {
        (**self).handle(cx, hcx, w, req)
    }
}

/// A [`Handler`] backed by a closure
///
/// Built with [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Create a [`Handler`] from a closure
///
/// The closure returns a boxed future so it can borrow its arguments:
///
/// ```rust,ignore
/// let hello = handler_fn(|_cx, hcx: &mut AppContext, w, _req| {
///     Box::pin(async move {
///         write_ok(w, &format!("hello {}", hcx.user))?;
///         Ok(())
///     })
/// });
/// ```
pub fn handler_fn<C, F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(
            &'a Context,
            &'a mut C,
            &'a mut dyn ResponseWriter,
            &'a mut Request,
        ) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    HandlerFn { f }
}

impl<C, F> Handler<C> for HandlerFn<F>
where
    F: for<'a> Fn(
            &'a Context,
            &'a mut C,
            &'a mut dyn ResponseWriter,
            &'a mut Request,
        ) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(
        &'a self,
        cx: &'a Context,
        hcx: &'a mut C,
        w: &'a mut dyn ResponseWriter,
        req: &'a mut Request,
    ) -> BoxFuture<'a, Result<()>> {
        (self.f)(cx, hcx, w, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::response::BufferedResponse;
    use bytes::Bytes;
    use http::StatusCode;

    #[derive(Default)]
    struct TestContext {
        user_id: String,
    }

    fn create_test_request(body: &'static str) -> Request {
        http::Request::builder()
            .method(http::Method::POST)
            .uri("/")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
            .into()
    }

    fn status_handler() -> BoxedHandler<TestContext> {
        handler_fn(|_cx, hcx: &mut TestContext, w, req| {
            Box::pin(async move {
                match req.body().as_ref() {
                    b"KO" => Err(Error::msg("not ok")),
                    _ => {
                        hcx.user_id = "vincent".to_string();
                        w.write_header(StatusCode::OK);
                        w.write(b"OK")?;
                        Ok(())
                    }
                }
            })
        })
        .boxed()
    }

    #[tokio::test]
    async fn test_handler_fn_success() {
        let handler = status_handler();

        let cx = Context::background();
        let mut hcx = TestContext::default();
        let mut w = BufferedResponse::new();
        let mut req = create_test_request("{}");

        handler.handle(&cx, &mut hcx, &mut w, &mut req).await.unwrap();

        assert_eq!(hcx.user_id, "vincent");
        assert_eq!(w.status(), Some(StatusCode::OK));
        assert_eq!(w.body(), b"OK");
    }

    #[tokio::test]
    async fn test_handler_fn_error() {
        let handler = status_handler();

        let cx = Context::background();
        let mut hcx = TestContext::default();
        let mut w = BufferedResponse::new();
        let mut req = create_test_request("KO");

        let err = handler
            .handle(&cx, &mut hcx, &mut w, &mut req)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "not ok");
        assert!(hcx.user_id.is_empty());
        assert_eq!(w.status(), None);
    }

    #[tokio::test]
    async fn test_arc_handler_delegates() {
        let handler: Arc<BoxedHandler<TestContext>> = Arc::new(status_handler());

        let cx = Context::background();
        let mut hcx = TestContext::default();
        let mut w = BufferedResponse::new();
        let mut req = create_test_request("{}");

        handler.handle(&cx, &mut hcx, &mut w, &mut req).await.unwrap();
        assert_eq!(w.body(), b"OK");
    }
}
