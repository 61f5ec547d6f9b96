//! Small application showing a shared stack diverging into two areas
//!
//! ```text
//! cargo run -p strata --example hello
//! curl http://127.0.0.1:8080/public/hello
//! curl -c jar http://127.0.0.1:8080/public/login
//! curl -b jar http://127.0.0.1:8080/account/me
//! ```

use std::sync::Arc;
use strata::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
struct User {
    name: String,
}

#[derive(Default)]
struct AppContext {
    user: Option<Arc<User>>,
}

fn parse_session_id(raw: &str) -> std::result::Result<u64, SessionError> {
    raw.parse()
        .map_err(|_| SessionError::InvalidId(raw.to_string()))
}

#[tokio::main]
async fn main() -> std::result::Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,strata=debug")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = MemoryStore::new();
    store.insert(1, User { name: "vincent".to_string() })?;
    let sessions = SessionLayer::new(store, parse_session_id);

    // Shared by both areas
    let mut common = Router::<AppContext>::new();
    common
        .use_middleware(RequestLogger::new(LoggingOptions::from_env()?))
        .use_middleware(sessions.clone())
        .add_fn(|_cx, hcx, _w, req| {
            Box::pin(async move {
                hcx.user = Session::<User>::from_request(req);
                Ok(())
            })
        });

    let public = common.handler_fn(move |_cx, _hcx, w, req| {
        let sessions = sessions.clone();
        Box::pin(async move {
            match req.shift_path().as_str() {
                "hello" => write_ok(w, "hello")?,
                "login" => {
                    sessions.set_cookie(w, "1").map_err(Error::new)?;
                    write_ok(w, "logged in")?;
                }
                _ => return Err(Error::not_found("not found")),
            }
            Ok(())
        })
    });

    let mut account = common.diverge();
    account.add_fn(|_cx, hcx, _w, _req| {
        Box::pin(async move {
            match hcx.user {
                Some(_) => Ok(()),
                None => Err(Error::unauthorized("login first")),
            }
        })
    });
    let account = account.handler_fn(|_cx, hcx, w, _req| {
        Box::pin(async move {
            let name = hcx.user.as_ref().map(|user| user.name.as_str()).unwrap_or("");
            write_ok(w, &format!("you are {name}"))?;
            Ok(())
        })
    });

    let app = handler_fn(move |cx, hcx: &mut AppContext, w, req| {
        let public = public.clone();
        let account = account.clone();
        Box::pin(async move {
            match req.shift_path().as_str() {
                "public" => public.handle(cx, hcx, w, req).await,
                "account" => account.handle(cx, hcx, w, req).await,
                _ => Err(Error::not_found("not found")),
            }
        })
    });

    let adapter = Adapter::new(app.boxed(), |_req: &Request| AppContext::default())
        .with_config(AdapterConfig::from_env()?);

    serve("127.0.0.1:8080", adapter).await
}
