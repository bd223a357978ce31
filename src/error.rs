//! Unified error type.

use thiserror::Error;

/// The error type returned by shroud's fallible operations.
///
/// Every variant is a startup failure. Per-request problems (an unreachable
/// backend, a timeout) are expressed as HTTP [`Response`](crate::Response)
/// values produced by the pipeline, never as `Error`s.
#[derive(Debug, Error)]
pub enum Error {
    /// Binding the listener or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The backend root URL could not be used as a proxy target.
    #[error("invalid backend url `{url}`: {reason}")]
    Backend { url: String, reason: String },

    /// The query augmentation string is malformed.
    ///
    /// The offending string is deliberately absent: it usually carries an
    /// API key.
    #[error("invalid query augmentation: {0}")]
    Augment(String),

    /// An environment value is missing or does not parse.
    #[error("invalid value for {var}: {reason}")]
    Config { var: &'static str, reason: String },
}

impl Error {
    pub(crate) fn backend(url: &str, reason: impl Into<String>) -> Self {
        Self::Backend { url: url.to_owned(), reason: reason.into() }
    }
}
