//! Session loading middleware

use crate::error::{Result, SessionError};
use crate::store::Store;
use cookie::{Cookie, SameSite};
use http::header::{HeaderValue, COOKIE, SET_COOKIE};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use strata_core::{
    BoxFuture, BoxedHandler, Context, Handler, Middleware, Request, ResponseWriter,
};

/// Parses the raw session cookie value into a session id
pub type IdExtractor<Id> = Arc<dyn Fn(&str) -> Result<Id> + Send + Sync>;

/// Session middleware configuration
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Name of the session cookie
    pub cookie_name: String,
    /// Lifetime of the cookie written by [`SessionLayer::set_cookie`]
    pub cookie_max_age: Duration,
    /// Path attribute of the session cookie
    pub cookie_path: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            cookie_max_age: Duration::from_secs(365 * 24 * 60 * 60),
            cookie_path: "/".to_string(),
        }
    }
}

/// A loaded session, stored in the request extensions
pub struct SessionValue<V>(pub Arc<V>);

impl<V> Clone for SessionValue<V> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Access to the session loaded by a [`SessionLayer`]
pub struct Session<V>(PhantomData<V>);

impl<V: Send + Sync + 'static> Session<V> {
    /// The session attached to `req`, if one was found
    pub fn from_request(req: &Request) -> Option<Arc<V>> {
        req.extensions()
            .get::<SessionValue<V>>()
            .map(|session| session.0.clone())
    }
}

/// Middleware loading the session referenced by the session cookie
///
/// For every request the layer looks for the session cookie, turns its value
/// into an id with the extractor, and fetches the session from the store.
/// A session that was found is attached to the request, where later steps
/// read it with [`Session::from_request`].
///
/// The rest of the chain always runs: a missing cookie, an unknown session
/// or a failing store only mean there is no session.
///
/// # Example
///
/// ```rust,ignore
/// let store = MemoryStore::<u64, User>::new();
/// let sessions = SessionLayer::new(store, |raw| {
///     raw.parse::<u64>().map_err(|_| SessionError::InvalidId(raw.to_string()))
/// });
///
/// let mut router = Router::<AppContext>::new();
/// router.use_middleware(sessions.clone());
/// router.add_fn(|_cx, hcx, _w, req| Box::pin(async move {
///     hcx.user = Session::<User>::from_request(req);
///     Ok(())
/// }));
/// ```
pub struct SessionLayer<Id, V> {
    store: Arc<dyn Store<Id, V>>,
    extractor: IdExtractor<Id>,
    options: Arc<SessionOptions>,
}

impl<Id, V> Clone for SessionLayer<Id, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            extractor: self.extractor.clone(),
            options: self.options.clone(),
        }
    }
}

impl<Id, V> SessionLayer<Id, V>
where
    Id: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new<S, F>(store: S, extractor: F) -> Self
    where
        S: Store<Id, V>,
        F: Fn(&str) -> Result<Id> + Send + Sync + 'static,
    {
        Self {
            store: Arc::new(store),
            extractor: Arc::new(extractor),
            options: Arc::new(SessionOptions::default()),
        }
    }

    /// Replace all options
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    /// Set the session cookie name
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.options).cookie_name = name.into();
        self
    }

    /// Set the lifetime of the session cookie
    pub fn cookie_max_age(mut self, max_age: Duration) -> Self {
        Arc::make_mut(&mut self.options).cookie_max_age = max_age;
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Append a `Set-Cookie` header carrying `value` as the session cookie
    ///
    /// The cookie is `Secure`, `HttpOnly` and `SameSite=Strict`. Must be
    /// called before the response status is sent.
    pub fn set_cookie(&self, w: &mut dyn ResponseWriter, value: &str) -> Result<()> {
        let max_age = i64::try_from(self.options.cookie_max_age.as_secs()).unwrap_or(i64::MAX);
        let cookie = Cookie::build((self.options.cookie_name.clone(), value.to_owned()))
            .path(self.options.cookie_path.clone())
            .secure(true)
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(cookie::time::Duration::seconds(max_age))
            .build();

        let header = HeaderValue::from_str(&cookie.to_string())?;
        w.headers_mut().append(SET_COOKIE, header);
        Ok(())
    }

    /// Load the session referenced by the request cookie
    async fn load(&self, cx: &Context, req: &Request) -> Result<Option<V>> {
        let raw = match session_cookie(req, &self.options.cookie_name) {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let id = (self.extractor)(&raw).map_err(|err| {
            tracing::error!(error = %err, "unable to extract session id");
            err
        })?;

        self.store.fetch(cx, &id).await.map_err(|err| {
            tracing::error!(error = %err, "unable to fetch session");
            err
        })
    }
}

/// Value of the first cookie named `name` across all `Cookie` headers
fn session_cookie(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|cookie| cookie.ok())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

impl<C, Id, V> Middleware<C> for SessionLayer<Id, V>
where
    C: Send + 'static,
    Id: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn wrap(&self, next: BoxedHandler<C>) -> BoxedHandler<C> {
        Arc::new(SessionHandler {
            layer: self.clone(),
            next,
        })
    }
}

struct SessionHandler<C, Id, V> {
    layer: SessionLayer<Id, V>,
    next: BoxedHandler<C>,
}

impl<C, Id, V> Handler<C> for SessionHandler<C, Id, V>
where
    C: Send + 'static,
    Id: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn handle<'a>(
        &'a self,
        cx: &'a Context,
        hcx: &'a mut C,
        w: &'a mut dyn ResponseWriter,
        req: &'a mut Request,
    ) -> BoxFuture<'a, strata_core::Result<()>> {
        Box::pin(async move {
            // Failures are logged by `load`
            let loaded = self.layer.load(cx, req).await;
            if let Ok(Some(session)) = loaded {
                tracing::debug!("session loaded");
                req.extensions_mut()
                    .insert(SessionValue(Arc::new(session)));
            }

            self.next.handle(cx, hcx, w, req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use bytes::Bytes;
    use strata_core::BufferedResponse;

    type Layer = SessionLayer<u64, String>;

    fn parse_id(raw: &str) -> Result<u64> {
        raw.parse()
            .map_err(|_| SessionError::InvalidId(raw.to_string()))
    }

    fn create_test_request(cookie: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Bytes::new()).unwrap().into()
    }

    #[test]
    fn test_default_options() {
        let layer: Layer = SessionLayer::new(MemoryStore::new(), parse_id);
        assert_eq!(layer.options().cookie_name, "session");
        assert_eq!(
            layer.options().cookie_max_age,
            Duration::from_secs(365 * 24 * 3600)
        );
    }

    #[test]
    fn test_session_cookie_lookup() {
        let req = create_test_request(Some("theme=dark; session=42; other=1"));
        assert_eq!(session_cookie(&req, "session").as_deref(), Some("42"));
        assert_eq!(session_cookie(&req, "missing"), None);

        let req = create_test_request(None);
        assert_eq!(session_cookie(&req, "session"), None);
    }

    #[test]
    fn test_set_cookie_attributes() {
        let layer: Layer = SessionLayer::new(MemoryStore::new(), parse_id)
            .cookie_name("sid")
            .cookie_max_age(Duration::from_secs(3600));

        let mut w = BufferedResponse::new();
        layer.set_cookie(&mut w, "42").unwrap();

        let header = w.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        let cookie = Cookie::parse(header).unwrap();
        assert_eq!(cookie.name(), "sid");
        assert_eq!(cookie.value(), "42");
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::seconds(3600)));
    }

    #[test]
    fn test_set_cookie_rejects_invalid_value() {
        let layer: Layer = SessionLayer::new(MemoryStore::new(), parse_id);
        let mut w = BufferedResponse::new();

        let err = layer.set_cookie(&mut w, "bad\nvalue").unwrap_err();
        assert!(matches!(err, SessionError::InvalidCookie(_)));
    }

    #[tokio::test]
    async fn test_load() {
        let store = MemoryStore::new();
        store.insert(42, "vincent".to_string()).unwrap();
        let layer: Layer = SessionLayer::new(store, parse_id);
        let cx = Context::background();

        let found = layer
            .load(&cx, &create_test_request(Some("session=42")))
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("vincent"));

        let unknown = layer
            .load(&cx, &create_test_request(Some("session=7")))
            .await
            .unwrap();
        assert_eq!(unknown, None);

        let missing = layer.load(&cx, &create_test_request(None)).await.unwrap();
        assert_eq!(missing, None);

        let invalid = layer
            .load(&cx, &create_test_request(Some("session=abc")))
            .await;
        assert!(matches!(invalid, Err(SessionError::InvalidId(_))));
    }
}
