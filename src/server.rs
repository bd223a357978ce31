//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Tells every open connection to wind down: requests already in flight
//!    finish and get their response, idle keep-alive connections are closed.
//! 3. Returns from [`Server::serve`] once they are gone, or after thirty
//!    seconds at the latest, which lets `main` exit cleanly.
//!
//! An in-flight request whose caller hangs up is dropped by hyper; dropping
//! it drops the backend request too, and the client pool discards that
//! connection instead of reusing it.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::handler::BoxedHandler;
use crate::request;
use crate::response::Response;

/// Upper bound on how long shutdown waits for in-flight requests.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds `addr`. Port `0` picks a free port; see [`local_addr`](Server::local_addr).
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections and dispatches every request to `handler` until
    /// the process receives SIGTERM or Ctrl-C.
    pub async fn serve(self, handler: BoxedHandler) -> Result<(), Error> {
        self.serve_with_shutdown(handler, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves. Returns once every in-flight request has been answered.
    pub async fn serve_with_shutdown(
        self,
        handler: BoxedHandler,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let addr = self.local_addr()?;
        info!(%addr, "shroud listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();
        // Every connection is registered here so shutdown can close idle
        // keep-alive connections instead of waiting on the caller.
        let graceful = GracefulShutdown::new();
        // `auto::Builder` transparently handles both HTTP/1.1 and HTTP/2,
        // whatever the caller negotiates.
        let builder = ConnBuilder::new(TokioExecutor::new());

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal immediately stops
                // accepting, even if more connections are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let handler = handler.clone();
                    let io = TokioIo::new(stream);

                    // Called once per request on the connection, not once
                    // per connection.
                    let svc = service_fn(move |req| {
                        let handler = handler.clone();
                        async move { dispatch(handler, req, remote_addr).await }
                    });

                    let conn = graceful.watch(builder.serve_connection(io, svc).into_owned());
                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        tokio::select! {
            () = graceful.shutdown() => {}
            () = tokio::time::sleep(DRAIN_TIMEOUT) => {
                warn!(remaining = tasks.len(), "drain timed out, closing remaining connections");
                tasks.abort_all();
            }
        }
        while tasks.join_next().await.is_some() {}

        info!("shroud stopped");
        Ok(())
    }
}

/// Hands one request to the pipeline.
///
/// The error type is [`Infallible`]: every failure inside the pipeline is
/// already a response (502, 400), so hyper never sees an error.
async fn dispatch(
    handler: BoxedHandler,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<Response, Infallible> {
    Ok(handler.call(request::from_hyper(req, remote_addr)).await)
}

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    // `pending()` is a future that never resolves, so on non-Unix platforms
    // the SIGTERM arm is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
