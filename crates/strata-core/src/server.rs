//! Minimal HTTP/1 server driving an [`Adapter`]

use crate::adapter::Adapter;
use crate::error::BoxError;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, info};

/// Bind `addr` and serve every connection with `adapter`
///
/// Runs until accepting a connection fails.
pub async fn serve<C, A>(addr: A, adapter: Adapter<C>) -> Result<(), BoxError>
where
    C: Send + 'static,
    A: ToSocketAddrs,
{
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    serve_listener(listener, adapter).await
}

/// Serve every connection accepted by `listener` with `adapter`
///
/// Each connection runs in its own task, with protocol upgrades enabled so
/// handlers can hijack it.
pub async fn serve_listener<C>(listener: TcpListener, adapter: Adapter<C>) -> Result<(), BoxError>
where
    C: Send + 'static,
{
    loop {
        let (stream, remote_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let adapter = adapter.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: hyper::Request<Incoming>| {
                let adapter = adapter.clone();
                async move { Ok::<_, Infallible>(adapter.call(req).await) }
            });

            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service)
                .with_upgrades()
                .await
            {
                debug!(remote_addr = %remote_addr, error = %err, "connection error");
            }
        });
    }
}
