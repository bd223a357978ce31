//! Query parameter injection.

use std::collections::BTreeMap;

use http::uri::{PathAndQuery, Uri};
use tracing::warn;

use crate::config::AugmentConfig;
use crate::form;
use crate::handler::{BoxFuture, Handler};
use crate::request::Request;
use crate::response;

/// Appends the configured parameters to every request's query string.
///
/// Configured values are *added* next to whatever the caller sent for the
/// same key: `q=a` with a configured `q=b` is forwarded as `q=a&q=b`. The
/// rebuilt query is ordered by key, so identical inputs always produce the
/// same string.
pub struct AugmentQuery<H> {
    inner: H,
    params: AugmentConfig,
}

impl<H: Handler> AugmentQuery<H> {
    pub fn new(inner: H, params: AugmentConfig) -> Self {
        Self { inner, params }
    }
}

impl<H: Handler> Handler for AugmentQuery<H> {
    fn call(&self, mut req: Request) -> BoxFuture {
        if self.params.is_empty() {
            return self.inner.call(req);
        }

        let query = merge_query(req.uri().query(), &self.params);
        match with_query(req.uri(), &query) {
            Ok(uri) => *req.uri_mut() = uri,
            Err(e) => {
                warn!(path = %req.uri().path(), error = %e, "cannot rebuild request target");
                return Box::pin(async { response::bad_request() });
            }
        }

        self.inner.call(req)
    }
}

/// Merges `params` into `query`, appending rather than replacing.
///
/// Works on raw bytes, so caller values that are not UTF-8 reach the backend
/// unchanged.
pub(crate) fn merge_query(query: Option<&str>, params: &AugmentConfig) -> String {
    let mut merged: BTreeMap<Vec<u8>, Vec<Vec<u8>>> = BTreeMap::new();

    for (key, value) in form::parse(query.unwrap_or_default().as_bytes()) {
        merged.entry(key).or_default().push(value);
    }
    for (key, value) in params.iter() {
        merged.entry(key.to_vec()).or_default().push(value.to_vec());
    }

    form::serialize(
        merged
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.as_slice(), v.as_slice()))),
    )
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, http::Error> {
    let path_and_query = if query.is_empty() {
        PathAndQuery::try_from(uri.path())?
    } else {
        PathAndQuery::try_from(format!("{}?{query}", uri.path()))?
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Ok(Uri::from_parts(parts)?)
}
