//! shroud binary.
//!
//! Run with:
//!   URL_ROOT=http://api.example.com/v1/ URL_SUFFIX='key=XXXXXX' PORT=8080 shroud
//!
//! Any configuration problem is reported once and the process exits with
//! `EX_CONFIG` before the listener is bound.

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use shroud::{Config, Server, pipeline};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(code) => ExitCode::from(code as u8),
    }
}

async fn run() -> Result<(), exitcode::ExitCode> {
    // A missing .env file is normal; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| {
        error!("configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        listen = %config.listen,
        backend = %config.backend,
        augmented_params = config.augment.len(),
        upstream_timeout = ?config.upstream_timeout,
        "configuration loaded"
    );

    let server = Server::bind(config.listen).await.map_err(|e| {
        error!(addr = %config.listen, "failed to bind: {e}");
        exitcode::UNAVAILABLE
    })?;

    server
        .serve(pipeline::from_config(config))
        .await
        .map_err(|e| {
            error!("server error: {e}");
            exitcode::SOFTWARE
        })
}
