//! Handler trait and type erasure.
//!
//! # One capability, many layers
//!
//! Every stage of the proxy is a [`Handler`]: it consumes a [`Request`] and
//! produces a future that resolves to a [`Response`]. Middleware holds the
//! handler it wraps and decides what to do before and after calling it, so
//! the whole pipeline is nothing more than nested values:
//!
//! ```text
//! Cors<AugmentQuery<RewriteHost<Forwarder>>>      ← built once at startup
//!        ↓ Arc::new(..)
//! BoxedHandler = Arc<dyn Handler>                 ← shared by every connection
//!        ↓ handler.call(req)  at request time     ← one vtable dispatch
//! BoxFuture                                       ← polled by hyper
//! ```
//!
//! `call` takes `&self` and returns a `'static` future, so a layer does its
//! request-side work synchronously, then hands the request to the inner
//! handler and only keeps the inner *future* alive. No layer needs to clone
//! itself per request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Pin<Box<…>>` is required because the async runtime must be able to poll
/// the future in-place. `Send + 'static` let tokio move the future across
/// threads safely.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

/// Consume a request, produce a response.
///
/// Implemented by the forwarder, by each middleware, and by any async
/// closure wrapped with [`handler_fn`].
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call(&self, req: Request) -> BoxFuture {
        (**self).call(req)
    }
}

/// Lifts an async function or closure into a [`Handler`].
///
/// ```rust
/// use shroud::{handler_fn, response, Request};
///
/// let teapot = handler_fn(|_req: Request| async {
///     response::status(http::StatusCode::IM_A_TEAPOT, "short and stout")
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FnHandler(f)
}

/// Newtype wrapper returned by [`handler_fn`], bridging a plain function to
/// the trait-object world.
pub struct FnHandler<F>(F);

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        Box::pin((self.0)(req))
    }
}
