//! HTTP/1.1 serve loop.
//!
//! Every accepted connection is served on its own task. The peer address is
//! attached to each request as [`RemoteAddr`] and connections are served
//! with upgrades enabled so WebSocket handlers can take them over.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use waymark_config::ServerSettings;

use crate::exchange::RemoteAddr;
use crate::router::Router;
use crate::shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};

/// How long [`serve`] waits for open connections after shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Error running the serve loop.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Listener I/O failed.
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves `router` on `listener` until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns [`ServeError::Io`] if the listener's address cannot be read.
pub async fn serve(listener: TcpListener, router: Arc<Router>) -> Result<(), ServeError> {
    serve_with_shutdown(
        listener,
        router,
        ShutdownSignal::with_os_signals(),
        DEFAULT_SHUTDOWN_TIMEOUT,
    )
    .await
}

/// Binds the configured address and serves `router` until `shutdown`.
///
/// # Errors
///
/// Returns [`ServeError::Bind`] if the address cannot be bound.
pub async fn run(
    settings: &ServerSettings,
    router: Arc<Router>,
    shutdown: ShutdownSignal,
) -> Result<(), ServeError> {
    let listener = TcpListener::bind(&settings.http_addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: settings.http_addr.clone(),
            source,
        })?;
    serve_with_shutdown(listener, router, shutdown, settings.shutdown_timeout()).await
}

/// Serves `router` on `listener` until `shutdown` triggers, then waits up to
/// `drain_timeout` for open connections to finish.
///
/// # Errors
///
/// Returns [`ServeError::Io`] if the listener's address cannot be read.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    router: Arc<Router>,
    shutdown: ShutdownSignal,
    drain_timeout: Duration,
) -> Result<(), ServeError> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "listening");

    let tracker = ConnectionTracker::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => spawn_connection(
                    stream,
                    peer,
                    Arc::clone(&router),
                    shutdown.clone(),
                    tracker.acquire(),
                ),
                Err(err) => tracing::warn!(error = %err, "failed to accept connection"),
            },
            () = shutdown.recv() => break,
        }
    }
    drop(listener);

    let open = tracker.active_connections();
    tracing::info!(open, "stopped accepting connections");
    if !tracker.drain(drain_timeout).await {
        tracing::warn!(
            open = tracker.active_connections(),
            timeout_secs = drain_timeout.as_secs(),
            "connections still open after shutdown timeout"
        );
    }
    tracing::info!("server stopped");
    Ok(())
}

fn spawn_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    shutdown: ShutdownSignal,
    token: ConnectionToken,
) {
    tokio::spawn(async move {
        let _token = token;
        let service = service_fn(move |mut request: Request<Incoming>| {
            let router = Arc::clone(&router);
            request.extensions_mut().insert(RemoteAddr(peer));
            async move { Ok::<_, Infallible>(router.handle(request).await) }
        });

        let conn = http1::Builder::new()
            .serve_connection(TokioIo::new(stream), service)
            .with_upgrades();
        tokio::pin!(conn);

        let result = tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        };
        if let Err(err) = result {
            tracing::debug!(%peer, error = %err, "connection closed with error");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Routes;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use waymark_core::Error;

    #[tokio::test]
    async fn test_serves_and_shuts_down() {
        let mut router = Router::builder().disable_auto_proxy().build().unwrap();
        router.literal("ip", |ctx| {
            let ip = ctx.remote_ip().map(|ip| ip.to_string());
            ctx.get(move || async move { Ok::<_, Error>(ip) });
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();
        let server = tokio::spawn(serve_with_shutdown(
            listener,
            Arc::new(router),
            shutdown.clone(),
            Duration::from_secs(1),
        ));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /ip HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.ends_with(r#""127.0.0.1""#), "{raw}");

        shutdown.trigger();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let settings = ServerSettings {
            http_addr: taken.local_addr().unwrap().to_string(),
            ..ServerSettings::default()
        };
        let router = Arc::new(Router::builder().build().unwrap());

        let err = run(&settings, router, ShutdownSignal::new()).await.unwrap_err();
        assert!(matches!(err, ServeError::Bind { .. }));
    }
}
