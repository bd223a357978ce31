//! Startup configuration loaded from environment variables.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `PORT` | `8080` | port to accept connections on |
//! | `HOST` | `0.0.0.0` | address to bind |
//! | `URL_ROOT` | required | backend root, e.g. `http://api.example.com/v1/` |
//! | `URL_SUFFIX` | empty | parameters appended to every request, e.g. `key=XXXX&lang=en` |
//! | `UPSTREAM_TIMEOUT_SECS` | `30` | how long to wait for the backend's response head |
//!
//! Everything is parsed exactly once. A malformed value is an [`Error`] that
//! the binary treats as fatal, so the proxy never serves traffic with an
//! ill-defined backend or augmentation set.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::Error;
use crate::form;
use crate::target::BackendTarget;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the process needs to start serving.
#[derive(Clone, Debug)]
pub struct Config {
    pub listen: SocketAddr,
    pub backend: BackendTarget,
    pub augment: AugmentConfig,
    pub upstream_timeout: Duration,
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Reads configuration through `lookup`, which returns `None` for unset
    /// variables. Lets tests supply an environment without touching the
    /// process one.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| Error::Config {
                var: "PORT",
                reason: format!("`{raw}`: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let host = match lookup("HOST") {
            Some(raw) => raw.trim().parse::<IpAddr>().map_err(|e| Error::Config {
                var: "HOST",
                reason: format!("`{raw}`: {e}"),
            })?,
            None => DEFAULT_HOST,
        };

        let root = lookup("URL_ROOT").ok_or(Error::Config {
            var: "URL_ROOT",
            reason: "not set".to_owned(),
        })?;
        let backend = BackendTarget::parse(root.trim())?;

        let augment = AugmentConfig::parse(&lookup("URL_SUFFIX").unwrap_or_default())?;

        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => {
                    return Err(Error::Config {
                        var: "UPSTREAM_TIMEOUT_SECS",
                        reason: "must be greater than zero".to_owned(),
                    });
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    return Err(Error::Config {
                        var: "UPSTREAM_TIMEOUT_SECS",
                        reason: format!("`{raw}`: {e}"),
                    });
                }
            },
            None => DEFAULT_UPSTREAM_TIMEOUT,
        };

        Ok(Self {
            listen: SocketAddr::new(host, port),
            backend,
            augment,
            upstream_timeout,
        })
    }
}

// ── Augmentation set ──────────────────────────────────────────────────────────

/// The query parameters appended to every proxied request.
///
/// Parsed from a `key=value&key2=value2` string. Keys are kept sorted; when a
/// key appears more than once in the source, its first value is the one used.
/// Names and values are kept as decoded bytes and need not be UTF-8.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct AugmentConfig {
    params: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl AugmentConfig {
    /// Parses a URL-encoded query string.
    ///
    /// Empty segments (`a=1&&b=2`) and the empty string are accepted. Bad
    /// percent escapes, `;` separators and unnamed parameters are not.
    pub fn parse(source: &str) -> Result<Self, Error> {
        let mut params = BTreeMap::new();

        for (index, segment) in source.split('&').enumerate() {
            if segment.is_empty() {
                continue;
            }
            if segment.contains(';') {
                return Err(Error::Augment(format!(
                    "parameter {index} contains `;`, separate parameters with `&`"
                )));
            }
            if let Some(offset) = bad_escape(segment) {
                return Err(Error::Augment(format!(
                    "parameter {index} has an invalid percent escape at byte {offset}"
                )));
            }

            // The segment holds no `&`, so it decodes to exactly one pair.
            let Some((key, value)) = form::parse(segment.as_bytes()).next() else {
                continue;
            };
            if key.is_empty() {
                return Err(Error::Augment(format!("parameter {index} has no name")));
            }
            params.entry(key).or_insert(value);
        }

        Ok(Self { params })
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[cfg(test)]
    fn get(&self, key: &str) -> Option<&[u8]> {
        self.params.get(key.as_bytes()).map(Vec::as_slice)
    }

    /// Parameter names and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.params.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

// Values are typically API keys; only the names are printed.
impl fmt::Debug for AugmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.params.keys().map(|k| String::from_utf8_lossy(k)))
            .finish()
    }
}

/// Byte offset of the first `%` not followed by two hex digits.
fn bad_escape(segment: &str) -> Option<usize> {
    let bytes = segment.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        if b != b'%' {
            return None;
        }
        let valid = bytes.len() > i + 2
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();
        (!valid).then_some(i)
    })
}
