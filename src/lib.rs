//! # shroud
//!
//! A minimal reverse proxy for one backend whose credentials callers must
//! never see.
//!
//! ## What it does to every request
//!
//! - **Augments the query** with a fixed set of parameters (typically an API
//!   key). Caller-supplied values for the same key are kept; the configured
//!   value is appended next to them.
//! - **Relabels `Host`** so the backend sees its own name, not the proxy's.
//! - **Forwards** to the backend over pooled connections, streaming bodies.
//!   An unreachable or silent backend becomes `502 Bad Gateway`.
//! - **Annotates the response** with `Access-Control-Allow-Origin: *` and
//!   `Access-Control-Allow-Headers: X-Requested-With`, whatever the outcome.
//!
//! What it deliberately leaves to other tools: TLS, caller authentication,
//! rate limiting, caching, retries and load balancing.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use shroud::{AugmentConfig, BackendTarget, Server, build_pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), shroud::Error> {
//!     let target = BackendTarget::parse("http://api.example.com/v1/")?;
//!     let augment = AugmentConfig::parse("key=XXXXXX&language=en")?;
//!
//!     Server::bind("0.0.0.0:8080".parse().unwrap())
//!         .await?
//!         .serve(build_pipeline(target, augment))
//!         .await
//! }
//! ```
//!
//! A request for `http://proxy/test?name=bob` then reaches the backend as
//! `http://api.example.com/v1/test?key=XXXXXX&language=en&name=bob`.

mod config;
mod error;
mod form;
mod forward;
mod handler;
mod request;
mod server;
mod target;

pub mod middleware;
pub mod pipeline;
pub mod response;

pub use config::{AugmentConfig, Config};
pub use error::Error;
pub use forward::Forwarder;
pub use handler::{BoxFuture, BoxedHandler, FnHandler, Handler, handler_fn};
pub use pipeline::build_pipeline;
pub use request::{RemoteAddr, Request};
pub use response::{Body, Response};
pub use server::Server;
pub use target::BackendTarget;
