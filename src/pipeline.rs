//! Pipeline composition.
//!
//! ```text
//! request ─▶ Cors ─▶ AugmentQuery ─▶ RewriteHost ─▶ Forwarder ─▶ backend
//! response ◀─ Cors ◀──────────────────────────────── Forwarder ◀─ backend
//! ```
//!
//! The order is fixed. `Cors` sits outermost so gateway errors and the
//! augmenter's own rejections are annotated too. `RewriteHost` sits directly
//! on the forwarder so nothing can touch `Host` after it.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AugmentConfig, Config};
use crate::forward::{DEFAULT_TIMEOUT, Forwarder};
use crate::handler::BoxedHandler;
use crate::middleware::{AugmentQuery, Cors, RewriteHost};
use crate::target::BackendTarget;

/// Builds the proxy handler for `target`, appending `augment` to every
/// request, with the default upstream timeout.
pub fn build_pipeline(target: BackendTarget, augment: AugmentConfig) -> BoxedHandler {
    compose(Arc::new(target), augment, DEFAULT_TIMEOUT)
}

/// Builds the proxy handler described by a loaded [`Config`].
pub fn from_config(config: Config) -> BoxedHandler {
    compose(Arc::new(config.backend), config.augment, config.upstream_timeout)
}

fn compose(target: Arc<BackendTarget>, augment: AugmentConfig, timeout: Duration) -> BoxedHandler {
    let forwarder = Forwarder::new(Arc::clone(&target)).timeout(timeout);
    let host = RewriteHost::new(forwarder, target);
    let query = AugmentQuery::new(host, augment);
    Arc::new(Cors::new(query))
}
