//! Bridge between hyper and a composed handler
//!
//! [`Adapter`] owns a [`BoxedHandler`] and everything needed to run it for an
//! incoming `http::Request`: it buffers the body, derives the request
//! [`Context`], builds the handler context `C` and turns a failed chain into
//! a response.

use crate::config::{self, ConfigError};
use crate::context::Context;
use crate::error::{BoxError, Error};
use crate::handler::{BoxedHandler, Handler};
use crate::helpers;
use crate::request::Request;
use crate::response::{BufferedResponse, Response, ResponseWriter};
use http::header::{HeaderValue, UPGRADE, X_CONTENT_TYPE_OPTIONS};
use http::StatusCode;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Builds the handler context of a request
pub type ContextFactory<C> = Arc<dyn Fn(&Request) -> C + Send + Sync>;

/// Adapter configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Deadline given to each request, in milliseconds
    pub request_timeout_ms: Option<u64>,
    /// Largest request body accepted, in bytes
    pub max_body_bytes: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: None,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl AdapterConfig {
    /// Load the configuration from `STRATA_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        config::from_env("STRATA_")
    }

    /// Give every request a deadline
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the largest request body accepted
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    fn timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Runs a composed handler for `http::Request`s
///
/// # Example
///
/// ```rust,ignore
/// let handler = router.handler_fn(|_cx, hcx, w, _req| Box::pin(async move {
///     write_ok(w, &hcx.greeting)?;
///     Ok(())
/// }));
///
/// let adapter = Adapter::new(handler, |_req| AppContext::default());
/// strata_core::serve("127.0.0.1:8080", adapter).await?;
/// ```
pub struct Adapter<C> {
    handler: BoxedHandler<C>,
    factory: ContextFactory<C>,
    config: Arc<AdapterConfig>,
}

impl<C> Clone for Adapter<C> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            factory: self.factory.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: Send + 'static> Adapter<C> {
    /// Create an adapter building each handler context with `factory`
    pub fn new<F>(handler: BoxedHandler<C>, factory: F) -> Self
    where
        F: Fn(&Request) -> C + Send + Sync + 'static,
    {
        Self {
            handler,
            factory: Arc::new(factory),
            config: Arc::new(AdapterConfig::default()),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: AdapterConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Run the handler for `req`
    ///
    /// Never fails: body read errors and handler errors are turned into
    /// responses. A handler error only sets the status and body when the
    /// chain had not sent a status yet.
    pub async fn call<B>(&self, req: http::Request<B>) -> Response
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let mut req = req;
        let upgrade = req
            .headers()
            .contains_key(UPGRADE)
            .then(|| hyper::upgrade::on(&mut req));

        let (parts, body) = req.into_parts();
        let body = match Limited::new(body, self.config.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                let status = if err.downcast_ref::<LengthLimitError>().is_some() {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                tracing::debug!(error = %err, status = status.as_u16(), "failed to read request body");
                return error_response(status, &err.to_string());
            }
        };

        let mut request = Request::new(parts, body);
        let cx = match self.config.timeout() {
            Some(timeout) => Context::background().with_timeout(timeout),
            None => Context::background(),
        };
        let mut hcx = (self.factory)(&request);
        let mut w = match upgrade {
            Some(upgrade) => BufferedResponse::with_upgrade(upgrade),
            None => BufferedResponse::new(),
        };

        let result = cx
            .run(self.handler.handle(&cx, &mut hcx, &mut w, &mut request))
            .await
            .and_then(|result| result);

        if let Err(err) = result {
            tracing::error!(
                error = %err,
                method = %request.method(),
                path = request.uri().path(),
                "handler failed"
            );
            if w.status().is_none() {
                write_failure(&mut w, &err);
            }
        }

        w.into_response()
    }
}

/// Respond like a plain-text error page: message followed by a newline
fn write_failure(w: &mut BufferedResponse, err: &Error) {
    w.headers_mut()
        .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    if let Err(io_err) = helpers::write_fmt(w, err.status(), format_args!("{err}\n")) {
        tracing::debug!(error = %io_err, "failed to write error response");
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let mut w = BufferedResponse::new();
    write_failure(&mut w, &Error::with_status(status, message));
    w.into_response()
}
