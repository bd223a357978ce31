//! Cross-origin response headers.

use http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, HeaderMap, HeaderValue};

use crate::handler::{BoxFuture, Handler};
use crate::request::Request;

/// Marks every response readable by browser scripts on any origin.
///
/// Runs after the wrapped handler, whatever it returned: relayed backend
/// answers, gateway errors, and responses the proxy made up itself all get
/// the headers. Existing values are replaced, so wrapping twice or a backend
/// that already sends them never produces duplicates.
pub struct Cors<H> {
    inner: H,
}

impl<H: Handler> Cors<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: Handler> Handler for Cors<H> {
    fn call(&self, req: Request) -> BoxFuture {
        let fut = self.inner.call(req);
        Box::pin(async move {
            let mut res = fut.await;
            annotate(res.headers_mut());
            res
        })
    }
}

fn annotate(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("X-Requested-With"),
    );
}
