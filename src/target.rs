//! The single upstream every request is forwarded to.

use std::fmt;

use http::header::HeaderValue;
use http::uri::{Authority, PathAndQuery, Scheme};
use http::Uri;
use url::Url;

use crate::error::Error;

/// The parsed backend root URL.
///
/// Built once at startup and shared read-only by every request. The
/// authority and `Host` value are precomputed so the hot path only clones
/// them.
#[derive(Clone, Debug)]
pub struct BackendTarget {
    url: Url,
    authority: Authority,
    host: HeaderValue,
}

impl BackendTarget {
    /// Parses an absolute `http://host[:port][/base/path][?query]` URL.
    ///
    /// Only plain `http` backends are supported; the proxy opens no TLS
    /// connections of its own.
    pub fn parse(root: &str) -> Result<Self, Error> {
        let url = Url::parse(root).map_err(|e| Error::backend(root, e.to_string()))?;

        if url.scheme() != "http" {
            return Err(Error::backend(
                root,
                format!("unsupported scheme `{}`, expected `http`", url.scheme()),
            ));
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::backend(root, "missing host"))?;

        // `Url::port` is `None` for the scheme's default port, which is also
        // how a `Host` header leaves it out.
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };

        let host = HeaderValue::from_str(&authority)
            .map_err(|e| Error::backend(root, e.to_string()))?;
        let authority = authority
            .parse::<Authority>()
            .map_err(|e| Error::backend(root, e.to_string()))?;

        Ok(Self { url, authority, host })
    }

    /// `host[:port]` as a backend would read it from its `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// The precomputed `Host` header value.
    pub fn host_header(&self) -> HeaderValue {
        self.host.clone()
    }

    /// The path every forwarded path is appended to. At least `/`.
    pub fn base_path(&self) -> &str {
        self.url.path()
    }

    /// Maps an inbound request target onto the backend.
    ///
    /// The inbound path is joined onto the base path with exactly one slash
    /// between them. A query on the backend root is kept in front of the
    /// inbound query.
    pub fn rewrite_uri(&self, uri: &Uri) -> Result<Uri, http::Error> {
        let path = join_paths(self.base_path(), uri.path());

        let mut target = path;
        match (self.url.query().filter(|q| !q.is_empty()), uri.query().filter(|q| !q.is_empty())) {
            (Some(base), Some(query)) => {
                target.push('?');
                target.push_str(base);
                target.push('&');
                target.push_str(query);
            }
            (Some(only), None) | (None, Some(only)) => {
                target.push('?');
                target.push_str(only);
            }
            (None, None) => {}
        }

        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(PathAndQuery::try_from(target)?)
            .build()
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn parses_host_and_port() {
        let target = BackendTarget::parse("http://127.0.0.1:9000/api/").unwrap();
        assert_eq!(target.authority().as_str(), "127.0.0.1:9000");
        assert_eq!(target.host_header(), "127.0.0.1:9000");
        assert_eq!(target.base_path(), "/api/");
    }

    #[test]
    fn default_port_is_left_out_of_host() {
        let target = BackendTarget::parse("http://api.example.com:80").unwrap();
        assert_eq!(target.host_header(), "api.example.com");
        assert_eq!(target.base_path(), "/");
    }

    #[test]
    fn rejects_relative_url() {
        let err = BackendTarget::parse("api.example.com/v1").unwrap_err();
        assert!(matches!(err, Error::Backend { .. }));
    }

    #[test]
    fn rejects_https() {
        let err = BackendTarget::parse("https://api.example.com").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(BackendTarget::parse("").is_err());
        assert!(BackendTarget::parse("http://").is_err());
    }

    #[test]
    fn joins_base_path_with_one_slash() {
        assert_eq!(join_paths("/api/", "/users"), "/api/users");
        assert_eq!(join_paths("/api", "users"), "/api/users");
        assert_eq!(join_paths("/api", "/users"), "/api/users");
        assert_eq!(join_paths("/", "/"), "/");
    }

    #[test]
    fn rewrites_scheme_authority_and_path() {
        let target = BackendTarget::parse("http://backend.local:8081/v2").unwrap();
        let out = target.rewrite_uri(&uri("/search?q=rust")).unwrap();
        assert_eq!(out.to_string(), "http://backend.local:8081/v2/search?q=rust");
    }

    #[test]
    fn absolute_inbound_uri_loses_its_authority() {
        let target = BackendTarget::parse("http://backend.local").unwrap();
        let out = target.rewrite_uri(&uri("http://proxy.example.com/x?y=1")).unwrap();
        assert_eq!(out.to_string(), "http://backend.local/x?y=1");
    }

    #[test]
    fn backend_query_goes_first() {
        let target = BackendTarget::parse("http://backend.local/?fmt=json").unwrap();

        let out = target.rewrite_uri(&uri("/a?b=c")).unwrap();
        assert_eq!(out.to_string(), "http://backend.local/a?fmt=json&b=c");

        let out = target.rewrite_uri(&uri("/a")).unwrap();
        assert_eq!(out.to_string(), "http://backend.local/a?fmt=json");
    }
}
