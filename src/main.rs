#![forbid(unsafe_code)]

//! `agi-link` — routing `FastAGI` server.
//!
//! Loads the configuration, listens for Asterisk `FastAGI` connections and
//! answers each call with the command routed from its dialed number.

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use agi_link::cli::{LogFormat, ServerCli};
use agi_link::server::{self, ServerState};
use agi_link::{AppError, Result};

const DEFAULT_LOG_FILTER: &str = "info";

fn main() -> Result<()> {
    let args = ServerCli::parse();
    init_tracing(args.log_format)?;
    info!("agi-link server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: ServerCli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let config = args.load_config()?;

    info!(
        listen_addr = %config.listen_addr,
        routes = config.routes.len(),
        deadline_seconds = config.deadline_seconds,
        "configuration loaded"
    );

    // ── Start listener ──────────────────────────────────
    let listener = server::bind(&config).await?;
    let state = Arc::new(ServerState::new(config));
    let ct = CancellationToken::new();
    let server_handle = server::spawn_server(listener, state, ct.clone());

    // ── Wait for shutdown signal ────────────────────────
    let signal = shutdown_signal().await;
    info!(signal, "shutdown signal received");
    ct.cancel();

    server_handle
        .await
        .map_err(|err| AppError::Io(format!("server task failed: {err}")))?;
    info!("agi-link shut down");

    Ok(())
}

/// Wait for ctrl-c or, on Unix, SIGTERM. Returns the signal's name.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                return tokio::select! {
                    _ = tokio::signal::ctrl_c() => "SIGINT",
                    _ = sigterm.recv() => "SIGTERM",
                };
            }
            Err(err) => warn!(%err, "SIGTERM handler unavailable, waiting for ctrl-c"),
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "ctrl-c handler failed");
    }
    "SIGINT"
}

/// Install the global subscriber on stderr. `RUST_LOG` overrides
/// [`DEFAULT_LOG_FILTER`].
fn init_tracing(log_format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = match log_format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };
    installed.map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))
}
