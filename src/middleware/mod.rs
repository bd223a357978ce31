//! Middleware layer.
//!
//! Each middleware owns the [`Handler`](crate::Handler) it wraps and is a
//! `Handler` itself, so layers nest by value. Request-side work happens
//! synchronously inside `call`; response-side work is chained onto the inner
//! handler's future.
//!
//! | Layer | Side | Job |
//! |---|---|---|
//! | [`Cors`] | response | allow any origin to read the answer |
//! | [`AugmentQuery`] | request | append the configured query parameters |
//! | [`RewriteHost`] | request | present the backend's own `Host` |

mod cors;
mod host;
mod query;

pub use cors::Cors;
pub use host::RewriteHost;
pub use query::AugmentQuery;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use crate::handler::{BoxFuture, Handler};
    use crate::request::Request;
    use crate::response::{self, Response};

    /// Remembers the `(uri, host)` of every request it sees and answers with
    /// a fixed status.
    #[derive(Clone, Default)]
    pub(crate) struct Recorder {
        pub(crate) seen: Arc<Mutex<Vec<(String, Option<String>)>>>,
    }

    impl Recorder {
        pub(crate) fn last(&self) -> (String, Option<String>) {
            self.seen.lock().unwrap().last().cloned().expect("no request recorded")
        }
    }

    impl Handler for Recorder {
        fn call(&self, req: Request) -> BoxFuture {
            let host = req
                .headers()
                .get(http::header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            self.seen.lock().unwrap().push((req.uri().to_string(), host));
            Box::pin(async { Response::new(response::empty()) })
        }
    }

    pub(crate) fn request(uri: &str) -> Request {
        http::Request::builder()
            .uri(uri)
            .header(http::header::HOST, "proxy.example.com")
            .body(response::empty())
            .unwrap()
    }
}
