//! Request logging middleware
//!
//! Logs one event per request once the rest of the chain has run, with the
//! original URL, the response status and size, and optionally the method,
//! the elapsed time and the request headers.
//!
//! Severity follows the response status:
//!
//! | status                              | level                   |
//! |-------------------------------------|-------------------------|
//! | below `error_threshold`             | `LoggingOptions::level` |
//! | from `error_threshold`, `>= 500`    | `ERROR`                 |
//! | from `error_threshold`, below 500   | `WARN`                  |
//!
//! Statuses below `error_threshold` count as success, even server errors
//! when the threshold is above 500. Successful requests can be silenced
//! entirely with `only_errors`, or per request with a `log_check` predicate.
//!
//! The logger only times what runs after it, so register it first to cover
//! the whole chain. The rest of the chain runs under the request deadline: a
//! request cut off by it is still logged, with the status of
//! [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded).

use super::Middleware;
use crate::config::{self, ConfigError};
use crate::context::Context;
use crate::error::Result;
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::observer::ResponseObserver;
use crate::request::Request;
use crate::response::ResponseWriter;
use http::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Predicate deciding whether a successful request is logged
pub type LogCheck = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Severity of a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            LogLevel::Trace => tracing::event!(tracing::Level::TRACE, $($arg)+),
            LogLevel::Debug => tracing::event!(tracing::Level::DEBUG, $($arg)+),
            LogLevel::Info => tracing::event!(tracing::Level::INFO, $($arg)+),
            LogLevel::Warn => tracing::event!(tracing::Level::WARN, $($arg)+),
            LogLevel::Error => tracing::event!(tracing::Level::ERROR, $($arg)+),
        }
    };
}

/// Request logger configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Level used for successful requests
    pub level: LogLevel,
    /// First status code treated as an error
    pub error_threshold: u16,
    /// Skip successful requests entirely
    pub only_errors: bool,
    /// Called for successful requests; returning `false` skips the event
    #[serde(skip)]
    pub log_check: Option<LogCheck>,
    /// Record the request headers
    pub include_headers: bool,
    /// Record the time spent in the rest of the chain
    pub include_elapsed: bool,
    /// Record the request method
    pub include_method: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            error_threshold: 400,
            only_errors: false,
            log_check: None,
            include_headers: false,
            include_elapsed: true,
            include_method: true,
        }
    }
}

impl fmt::Debug for LoggingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingOptions")
            .field("level", &self.level)
            .field("error_threshold", &self.error_threshold)
            .field("only_errors", &self.only_errors)
            .field("log_check", &self.log_check.is_some())
            .field("include_headers", &self.include_headers)
            .field("include_elapsed", &self.include_elapsed)
            .field("include_method", &self.include_method)
            .finish()
    }
}

impl LoggingOptions {
    /// Load options from `STRATA_LOG_*` environment variables
    ///
    /// Unset variables keep their default value. `log_check` cannot be set
    /// from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        config::from_env("STRATA_LOG_")
    }

    /// Set the level used for successful requests
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the first status code treated as an error
    pub fn error_threshold(mut self, status: u16) -> Self {
        self.error_threshold = status;
        self
    }

    /// Only log requests that ended in an error status
    pub fn only_errors(mut self, enabled: bool) -> Self {
        self.only_errors = enabled;
        self
    }

    /// Filter successful requests with `check`
    pub fn log_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.log_check = Some(Arc::new(check));
        self
    }

    /// Record the request headers
    pub fn include_headers(mut self, enabled: bool) -> Self {
        self.include_headers = enabled;
        self
    }

    /// Record the elapsed time
    pub fn include_elapsed(mut self, enabled: bool) -> Self {
        self.include_elapsed = enabled;
        self
    }

    /// Record the request method
    pub fn include_method(mut self, enabled: bool) -> Self {
        self.include_method = enabled;
        self
    }

    fn level_for(&self, status: StatusCode) -> Option<LogLevel> {
        let code = status.as_u16();
        if code < self.error_threshold {
            return (!self.only_errors).then_some(self.level);
        }
        if code >= 500 {
            Some(LogLevel::Error)
        } else {
            Some(LogLevel::Warn)
        }
    }
}

/// Middleware logging every request that goes through it
///
/// # Example
///
/// ```rust,ignore
/// use strata_core::middleware::{LogLevel, LoggingOptions, RequestLogger};
///
/// let mut router = Router::<AppContext>::new();
/// router.use_middleware(RequestLogger::new(
///     LoggingOptions::default()
///         .level(LogLevel::Debug)
///         .log_check(|req| req.uri().path() != "/health"),
/// ));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestLogger {
    options: Arc<LoggingOptions>,
}

impl RequestLogger {
    pub fn new(options: LoggingOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    /// The options this logger was built with
    pub fn options(&self) -> &LoggingOptions {
        &self.options
    }
}

impl<C: Send + 'static> Middleware<C> for RequestLogger {
    fn wrap(&self, next: BoxedHandler<C>) -> BoxedHandler<C> {
        Arc::new(LoggerHandler {
            options: self.options.clone(),
            next,
        })
    }
}

struct LoggerHandler<C> {
    options: Arc<LoggingOptions>,
    next: BoxedHandler<C>,
}

impl<C: Send + 'static> Handler<C> for LoggerHandler<C> {
    fn handle<'a>(
        &'a self,
        cx: &'a Context,
        hcx: &'a mut C,
        w: &'a mut dyn ResponseWriter,
        req: &'a mut Request,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let options = &self.options;

            // Downstream steps may shift the path, keep what the client asked for
            let url = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_owned())
                .unwrap_or_else(|| "/".to_owned());
            let method = req.method().clone();
            let headers = options.include_headers.then(|| req.headers().clone());

            let start = Instant::now();
            let mut observer = ResponseObserver::new(w);
            let result = cx
                .run(self.next.handle(cx, hcx, &mut observer, req))
                .await
                .and_then(|result| result);
            let elapsed = start.elapsed();

            let status = observer.status().unwrap_or_else(|| match &result {
                Ok(()) => StatusCode::OK,
                Err(err) => err.status(),
            });
            let size = observer.size() as u64;

            let level = match options.level_for(status) {
                Some(level) => level,
                None => return result,
            };
            if status.as_u16() < options.error_threshold {
                if let Some(check) = &options.log_check {
                    if !check(req) {
                        return result;
                    }
                }
            }

            let method = options.include_method.then(|| method.as_str());
            let elapsed_ms = options
                .include_elapsed
                .then(|| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
            let headers = headers.as_ref().map(tracing::field::debug);

            log_at!(
                level,
                url = url.as_str(),
                status_code = status.as_u16(),
                response_size = size,
                method = method,
                elapsed_ms = elapsed_ms,
                headers = headers,
                "request handled"
            );

            result
        })
    }
}
