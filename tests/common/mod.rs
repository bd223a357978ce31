//! Shared helpers for the end-to-end tests.

use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use shroud::{AugmentConfig, BackendTarget, Server, build_pipeline};

/// Starts a backend that echoes what it received.
///
/// The answer carries `x-seen-host`, `x-seen-path`, `x-seen-query` and
/// `x-seen-method` headers describing the request, the request body as its
/// own body, and the status given in an `x-reply-status` request header
/// (200 when absent).
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let svc = service_fn(echo);
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), svc)
                    .await;
            });
        }
    });

    addr
}

async fn echo(
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    };
    let host = header("host");
    let forwarded_for = header("x-forwarded-for");
    let status = header("x-reply-status").parse::<u16>().unwrap_or(200);
    let method = req.method().to_string();
    let path = req.uri().path().to_owned();
    let query = req.uri().query().unwrap_or_default().to_owned();

    let body = req.into_body().collect().await.unwrap().to_bytes();

    let res = hyper::Response::builder()
        .status(status)
        .header("x-seen-host", host)
        .header("x-seen-path", path)
        .header("x-seen-query", query)
        .header("x-seen-method", method)
        .header("x-seen-forwarded-for", forwarded_for)
        .body(Full::new(body))
        .unwrap();
    Ok(res)
}

/// A running proxy and the means to stop it.
pub struct Proxy {
    pub addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl Proxy {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.await.unwrap();
    }
}

/// Starts the full pipeline on an ephemeral port in front of `backend_root`.
pub async fn start_proxy(backend_root: &str, augment: &str) -> Proxy {
    let pipeline = build_pipeline(
        BackendTarget::parse(backend_root).unwrap(),
        AugmentConfig::parse(augment).unwrap(),
    );

    let server = Server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = server.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        server
            .serve_with_shutdown(pipeline, async move {
                let _ = stopped.await;
            })
            .await
            .unwrap();
    });

    Proxy { addr, stop: Some(stop), task }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

/// A caller that keeps idle connections open between requests, the way
/// browsers do.
pub fn keep_alive_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// A local address with nothing listening on it.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
