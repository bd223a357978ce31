//! Outgoing HTTP response type and the few responses the proxy makes up
//! itself.
//!
//! Almost every response is the backend's own, relayed untouched. The
//! constructors here cover the cases where there is no backend answer to
//! relay.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::StatusCode;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};

/// Streaming body shared by requests and responses.
///
/// `hyper::body::Incoming` from either side of the proxy boxes into this
/// without copying, so bodies flow through in chunks.
pub type Body = UnsyncBoxBody<Bytes, hyper::Error>;

/// A response travelling back through the pipeline.
pub type Response = http::Response<Body>;

/// A body with no bytes.
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A body that is already fully in memory.
pub fn full(chunk: impl Into<Bytes>) -> Body {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// A response generated by the proxy with a short plain-text explanation.
pub fn status(code: StatusCode, message: &'static str) -> Response {
    let mut res = http::Response::new(full(message));
    *res.status_mut() = code;
    res.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    res
}

/// `502 Bad Gateway`: the backend could not be reached or did not answer.
pub fn bad_gateway() -> Response {
    status(StatusCode::BAD_GATEWAY, "upstream request failed")
}

/// `400 Bad Request`: the request target cannot be rewritten.
pub fn bad_request() -> Response {
    status(StatusCode::BAD_REQUEST, "malformed request target")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bad_gateway_carries_text_body() {
        let res = bad_gateway();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");

        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "upstream request failed");
    }

    #[tokio::test]
    async fn empty_body_has_no_bytes() {
        let body = empty().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
