//! # strata
//!
//! Compose HTTP handlers out of small fallible steps.
//!
//! Each step receives the request, a response sink and a mutable, typed
//! handler context shared with the steps after it. A step that fails stops
//! the chain. Steps and middlewares are stacked in a [`Router`], which can be
//! forked with [`Router::diverge`] so several routes share a common prefix.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! #[derive(Default)]
//! struct AppContext {
//!     user: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), BoxError> {
//!     let mut router = Router::<AppContext>::new();
//!     router.use_middleware(RequestLogger::new(LoggingOptions::default()));
//!     router.add_fn(|_cx, hcx, _w, req| Box::pin(async move {
//!         hcx.user = req.path().trim_start_matches('/').to_string();
//!         Ok(())
//!     }));
//!
//!     let handler = router.handler_fn(|_cx, hcx, w, _req| Box::pin(async move {
//!         write_ok(w, &format!("hello {}", hcx.user))?;
//!         Ok(())
//!     }));
//!
//!     serve("127.0.0.1:8080", Adapter::new(handler, |_req| AppContext::default())).await
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `session` (default) - cookie based session middleware, see [`session`]

// Re-export core functionality
pub use strata_core::*;

#[cfg(feature = "session")]
pub use strata_session as session;

/// Prelude module - import everything you need with `use strata::prelude::*`
pub mod prelude {
    pub use strata_core::{
        handler_fn,
        middleware_fn,
        serve,
        shift_path,
        write_bad_request,
        write_error,
        write_ok,
        write_service_unavailable,
        write_text,
        write_unauthorized,
        Adapter,
        AdapterConfig,
        BoxError,
        BoxedHandler,
        Context,
        Error,
        Handler,
        LogLevel,
        LoggingOptions,
        Middleware,
        Request,
        RequestLogger,
        ResponseObserver,
        ResponseWriter,
        Result,
        Router,
    };

    #[cfg(feature = "session")]
    pub use strata_session::{MemoryStore, Session, SessionError, SessionLayer, Store};

    pub use tracing::{debug, error, info, trace, warn};
}
