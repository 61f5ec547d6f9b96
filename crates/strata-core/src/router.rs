//! Ordered handler composition
//!
//! A [`Router`] is an ordered stack of middlewares. Building it with
//! [`Router::handler`] folds the stack around a terminal handler, the first
//! registered middleware ending up outermost:
//!
//! ```text
//! Request  -> m1 -> m2 -> m3 -> terminal
//! Response <- m1 <- m2 <- m3 <- terminal
//! ```
//!
//! Routers are cheap to clone: [`Router::diverge`] gives a copy whose stack
//! can grow independently, so a common prefix can be shared by several
//! routes.

use crate::context::Context;
use crate::error::Result;
use crate::handler::{handler_fn, BoxFuture, BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware, Step};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Ordered stack of middlewares, composed into a single handler on demand
pub struct Router<C> {
    middlewares: Vec<BoxedMiddleware<C>>,
}

impl<C> Clone for Router<C> {
    fn clone(&self) -> Self {
        Self {
            middlewares: self.middlewares.clone(),
        }
    }
}

impl<C> Default for Router<C> {
    fn default() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }
}

impl<C> std::fmt::Debug for Router<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

impl<C: Send + 'static> Router<C> {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router from an initial sequence of middlewares
    pub fn with_middlewares<I>(middlewares: I) -> Self
    where
        I: IntoIterator<Item = BoxedMiddleware<C>>,
    {
        Self {
            middlewares: middlewares.into_iter().collect(),
        }
    }

    /// Append a middleware wrapping every step registered after it
    pub fn use_middleware<M>(&mut self, middleware: M) -> &mut Self
    where
        M: Middleware<C>,
    {
        self.middlewares.push(middleware.boxed());
        self
    }

    /// Append a step
    ///
    /// The step runs before everything registered after it. If it returns an
    /// error, the rest of the chain is skipped and the error is returned.
    pub fn add<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<C>,
    {
        self.middlewares.push(Step::new(handler.boxed()).boxed());
        self
    }

    /// Append a step from a closure
    pub fn add_fn<F>(&mut self, f: F) -> &mut Self
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
        self.add(handler_fn(f))
    }

    /// Copy this router
    ///
    /// The copy starts with the same stack. Appending to either router
    /// afterwards never affects the other one.
    pub fn diverge(&self) -> Self {
        self.clone()
    }

    /// Number of registered middlewares and steps
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Whether nothing was registered yet
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Compose the stack around `terminal`
    ///
    /// The terminal handler runs last, after every registered step
    /// succeeded. The returned handler can be shared across concurrent
    /// requests.
    pub fn handler<H>(&self, terminal: H) -> BoxedHandler<C>
    where
        H: Handler<C>,
    {
        self.middlewares
            .iter()
            .rev()
            .fold(terminal.boxed(), |next, middleware| middleware.wrap(next))
    }

    /// Compose the stack around a terminal closure
    pub fn handler_fn<F>(&self, f: F) -> BoxedHandler<C>
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
        self.handler(handler_fn(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::middleware::middleware_fn;
    use crate::response::BufferedResponse;
    use bytes::Bytes;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    type Trace = Arc<Mutex<Vec<String>>>;

    fn create_test_request() -> Request {
        http::Request::builder()
            .uri("/")
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    /// Step recording its name, failing when asked to
    fn named_step(trace: Trace, name: String, fail: bool) -> BoxedHandler<Vec<String>> {
        handler_fn(move |_cx, hcx: &mut Vec<String>, _w, _req| {
            let trace = trace.clone();
            let name = name.clone();
            Box::pin(async move {
                trace.lock().unwrap().push(name.clone());
                hcx.push(name.clone());
                if fail {
                    return Err(Error::msg(format!("{name} failed")));
                }
                Ok(())
            })
        })
        .boxed()
    }

    /// Middleware recording its name before and after the rest of the chain
    fn around(trace: Trace, name: String) -> impl Middleware<Vec<String>> {
        middleware_fn(move |next: BoxedHandler<Vec<String>>| {
            let trace = trace.clone();
            let name = name.clone();
            handler_fn(move |cx, hcx: &mut Vec<String>, w, req| {
                let next = next.clone();
                let trace = trace.clone();
                let name = name.clone();
                Box::pin(async move {
                    trace.lock().unwrap().push(format!("{name}:before"));
                    let result = next.handle(cx, hcx, w, req).await;
                    trace.lock().unwrap().push(format!("{name}:after"));
                    result
                })
            })
            .boxed()
        })
    }

    async fn run(handler: &BoxedHandler<Vec<String>>) -> (Result<()>, Vec<String>) {
        let mut hcx = Vec::new();
        let mut w = BufferedResponse::new();
        let result = handler
            .handle(&Context::background(), &mut hcx, &mut w, &mut create_test_request())
            .await;
        (result, hcx)
    }

    #[tokio::test]
    async fn test_empty_router_runs_terminal() {
        let trace: Trace = Arc::default();
        let router = Router::<Vec<String>>::new();
        assert!(router.is_empty());

        let handler = router.handler(named_step(trace.clone(), "terminal".into(), false));
        let (result, hcx) = run(&handler).await;

        assert!(result.is_ok());
        assert_eq!(hcx, vec!["terminal"]);
    }

    #[tokio::test]
    async fn test_middlewares_nest_in_registration_order() {
        let trace: Trace = Arc::default();
        let mut router = Router::<Vec<String>>::new();
        router
            .use_middleware(around(trace.clone(), "m1".into()))
            .use_middleware(around(trace.clone(), "m2".into()));

        let handler = router.handler(named_step(trace.clone(), "terminal".into(), false));
        let (result, _) = run(&handler).await;

        assert!(result.is_ok());
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["m1:before", "m2:before", "terminal", "m2:after", "m1:after"]
        );
    }

    #[tokio::test]
    async fn test_failing_step_stops_chain() {
        let trace: Trace = Arc::default();
        let mut router = Router::<Vec<String>>::new();
        router
            .add(named_step(trace.clone(), "s1".into(), false))
            .add(named_step(trace.clone(), "s2".into(), true))
            .add(named_step(trace.clone(), "s3".into(), false));

        let handler = router.handler(named_step(trace.clone(), "terminal".into(), false));
        let (result, hcx) = run(&handler).await;

        assert_eq!(result.unwrap_err().to_string(), "s2 failed");
        assert_eq!(hcx, vec!["s1", "s2"]);
    }

    #[tokio::test]
    async fn test_middleware_observes_error_of_later_step() {
        let trace: Trace = Arc::default();
        let mut router = Router::<Vec<String>>::new();
        router
            .use_middleware(around(trace.clone(), "m1".into()))
            .add(named_step(trace.clone(), "s1".into(), true));

        let handler = router.handler(named_step(trace.clone(), "terminal".into(), false));
        let (result, _) = run(&handler).await;

        assert!(result.is_err());
        assert_eq!(*trace.lock().unwrap(), vec!["m1:before", "s1", "m1:after"]);
    }

    #[tokio::test]
    async fn test_add_fn_shares_handler_context() {
        let mut router = Router::<Vec<String>>::new();
        router.add_fn(|_cx, hcx, _w, _req| {
            Box::pin(async move {
                hcx.push("from step".to_string());
                Ok(())
            })
        });

        let handler = router.handler_fn(|_cx, hcx, w, _req| {
            Box::pin(async move {
                w.write(hcx.join(",").as_bytes())?;
                Ok(())
            })
        });

        let mut hcx = Vec::new();
        let mut w = BufferedResponse::new();
        handler
            .handle(&Context::background(), &mut hcx, &mut w, &mut create_test_request())
            .await
            .unwrap();

        assert_eq!(w.body(), b"from step");
    }

    #[tokio::test]
    async fn test_diverge_is_independent() {
        let trace: Trace = Arc::default();
        let mut base = Router::<Vec<String>>::new();
        base.add(named_step(trace.clone(), "common".into(), false));

        let mut left = base.diverge();
        left.add(named_step(trace.clone(), "left".into(), false));

        base.add(named_step(trace.clone(), "base".into(), false));

        assert_eq!(base.len(), 2);
        assert_eq!(left.len(), 2);

        let (_, hcx) = run(&left.handler(named_step(trace.clone(), "t".into(), false))).await;
        assert_eq!(hcx, vec!["common", "left", "t"]);

        let (_, hcx) = run(&base.handler(named_step(trace.clone(), "t".into(), false))).await;
        assert_eq!(hcx, vec!["common", "base", "t"]);
    }

    #[tokio::test]
    async fn test_diverge_shares_step_instances() {
        let common_calls = Arc::new(AtomicUsize::new(0));
        let left_calls = Arc::new(AtomicUsize::new(0));
        let right_calls = Arc::new(AtomicUsize::new(0));

        let counter = |calls: Arc<AtomicUsize>| {
            handler_fn(move |_cx, _hcx: &mut Vec<String>, _w, _req| {
                let calls = calls.clone();
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
        };

        let mut base = Router::<Vec<String>>::new();
        base.add(counter(common_calls.clone()));

        let mut left = base.diverge();
        left.add(counter(left_calls.clone()));
        let mut right = base.diverge();
        right.add(counter(right_calls.clone()));

        let noop = || counter(Arc::new(AtomicUsize::new(0)));
        let left = left.handler(noop());
        let right = right.handler(noop());

        run(&left).await.0.unwrap();
        run(&left).await.0.unwrap();
        run(&right).await.0.unwrap();

        assert_eq!(common_calls.load(Ordering::SeqCst), 3);
        assert_eq!(left_calls.load(Ordering::SeqCst), 2);
        assert_eq!(right_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_is_reusable() {
        let trace: Trace = Arc::default();
        let mut router = Router::<Vec<String>>::new();
        router.add(named_step(trace.clone(), "s1".into(), false));
        let handler = router.handler(named_step(trace.clone(), "t".into(), false));

        for _ in 0..3 {
            let (result, hcx) = run(&handler).await;
            assert!(result.is_ok());
            assert_eq!(hcx, vec!["s1", "t"]);
        }
        assert_eq!(trace.lock().unwrap().len(), 6);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_steps_run_in_order_until_first_failure(
            failures in proptest::collection::vec(any::<bool>(), 0..8)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();

            let trace: Trace = Arc::default();
            let mut router = Router::<Vec<String>>::new();
            for (i, fail) in failures.iter().enumerate() {
                router.add(named_step(trace.clone(), format!("s{i}"), *fail));
            }
            let handler = router.handler(named_step(trace.clone(), "terminal".into(), false));

            let (result, hcx) = rt.block_on(run(&handler));

            let expected: Vec<String> = match failures.iter().position(|fail| *fail) {
                Some(first) => (0..=first).map(|i| format!("s{i}")).collect(),
                None => (0..failures.len())
                    .map(|i| format!("s{i}"))
                    .chain(std::iter::once("terminal".to_string()))
                    .collect(),
            };

            prop_assert_eq!(result.is_err(), failures.iter().any(|fail| *fail));
            prop_assert_eq!(hcx, expected);
        }

        #[test]
        fn prop_diverged_router_keeps_prefix(
            prefix in 0usize..5,
            left_extra in 0usize..5,
            right_extra in 0usize..5,
        ) {
            let trace: Trace = Arc::default();
            let mut base = Router::<Vec<String>>::new();
            for i in 0..prefix {
                base.add(named_step(trace.clone(), format!("p{i}"), false));
            }

            let mut left = base.diverge();
            for i in 0..left_extra {
                left.add(named_step(trace.clone(), format!("l{i}"), false));
            }
            for i in 0..right_extra {
                base.add(named_step(trace.clone(), format!("r{i}"), false));
            }

            prop_assert_eq!(left.len(), prefix + left_extra);
            prop_assert_eq!(base.len(), prefix + right_extra);
        }
    }
}
