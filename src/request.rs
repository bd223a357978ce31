//! Incoming HTTP request type.

use std::net::SocketAddr;

use http_body_util::BodyExt;

use crate::response::Body;

/// A request travelling through the pipeline.
///
/// The body is the caller's stream, boxed so that every handler in the chain
/// sees the same concrete type. Nothing buffers it.
pub type Request = http::Request<Body>;

/// The caller's socket address, stored in the request extensions by the
/// server before the pipeline sees the request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RemoteAddr(pub SocketAddr);

/// Converts a request as hyper hands it to us into a pipeline [`Request`].
pub(crate) fn from_hyper(
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Request {
    let mut req = req.map(BodyExt::boxed_unsync);
    req.extensions_mut().insert(RemoteAddr(remote_addr));
    req
}
