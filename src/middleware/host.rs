//! Outbound `Host` relabelling.

use std::sync::Arc;

use http::header::HOST;

use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::target::BackendTarget;

/// Presents the backend's own hostname in the `Host` header.
///
/// Whatever host the caller addressed the proxy with is discarded, so
/// virtual hosting, signed-URL checks and absolute-URL generation on the
/// backend all see the backend's canonical name.
pub struct RewriteHost<H> {
    inner: H,
    target: Arc<BackendTarget>,
}

impl<H: Handler> RewriteHost<H> {
    pub fn new(inner: H, target: Arc<BackendTarget>) -> Self {
        Self { inner, target }
    }
}

impl<H: Handler> Handler for RewriteHost<H> {
    fn call(&self, mut req: Request) -> BoxFuture {
        req.headers_mut().insert(HOST, self.target.host_header());
        self.inner.call(req)
    }
}
