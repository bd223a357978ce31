//! Forwarding to the backend.
//!
//! The forwarder is the innermost [`Handler`]: it points the request at the
//! [`BackendTarget`], sends it over a pooled connection and relays whatever
//! comes back. Bodies are streamed in both directions.
//!
//! Failure stays local to the request. A refused connection, a reset, or a
//! backend that does not answer in time becomes `502 Bad Gateway` for that
//! caller only. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::Version;
use http_body_util::BodyExt;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use crate::handler::{BoxFuture, Handler};
use crate::request::{RemoteAddr, Request};
use crate::response::{self, Body, Response};
use crate::target::BackendTarget;

/// Default time allowed for the backend's response head to arrive.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");
const PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

/// Headers that describe a single connection and must not cross the proxy.
const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    KEEP_ALIVE,
    PROXY_CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Sends requests to the single backend and relays the answers.
pub struct Forwarder {
    target: Arc<BackendTarget>,
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(target: Arc<BackendTarget>) -> Self {
        // The client is a cheap handle around a shared, internally
        // synchronised pool; every request clones it.
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { target, client, timeout: DEFAULT_TIMEOUT }
    }

    /// Sets how long to wait for the backend's status line and headers.
    /// The body that follows is not bounded.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Handler for Forwarder {
    fn call(&self, req: Request) -> BoxFuture {
        let client = self.client.clone();
        let target = Arc::clone(&self.target);
        let timeout = self.timeout;
        Box::pin(async move { forward(client, &target, timeout, req).await })
    }
}

async fn forward(
    client: Client<HttpConnector, Body>,
    target: &BackendTarget,
    timeout: Duration,
    req: Request,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let uri = match target.rewrite_uri(&parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            warn!(path = %parts.uri.path(), error = %e, "cannot map request onto backend");
            return response::bad_gateway();
        }
    };

    strip_hop_by_hop(&mut parts.headers);
    if let Some(RemoteAddr(addr)) = parts.extensions.get::<RemoteAddr>() {
        append_forwarded_for(&mut parts.headers, addr.ip());
    }

    let method = parts.method.clone();
    parts.uri = uri;
    // The backend connection speaks HTTP/1.1 whatever the caller negotiated.
    parts.version = Version::HTTP_11;

    debug!(%method, uri = %parts.uri, "forwarding");

    let outbound = http::Request::from_parts(parts, body);
    let res = match tokio::time::timeout(timeout, client.request(outbound)).await {
        Ok(Ok(res)) => res,
        Ok(Err(e)) => {
            warn!(%method, backend = %target.authority(), error = %e, "upstream request failed");
            return response::bad_gateway();
        }
        Err(_) => {
            warn!(%method, backend = %target.authority(), ?timeout, "upstream timed out");
            return response::bad_gateway();
        }
    };

    debug!(%method, status = %res.status(), "upstream responded");

    let (mut parts, body) = res.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    http::Response::from_parts(parts, body.boxed_unsync())
}

/// Removes hop-by-hop headers, including any the `Connection` header names.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Appends `ip` to the `X-Forwarded-For` chain, folding every prior
/// occurrence of the header into one value.
fn append_forwarded_for(headers: &mut HeaderMap, ip: std::net::IpAddr) {
    let mut chain: Vec<String> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect();
    chain.push(ip.to_string());

    if let Ok(value) = HeaderValue::from_str(&chain.join(", ")) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
