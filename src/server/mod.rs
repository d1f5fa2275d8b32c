//! `FastAGI` TCP server.
//!
//! Accepts connections from Asterisk, gives each one its own task and,
//! when configured, a [`deadline::Deadline`] bounding the whole exchange.
//! The exchange itself lives in [`handler::handle_connection`].

pub mod deadline;
pub mod handler;
pub mod router;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::agi::BlockReader;
use crate::config::GlobalConfig;
use crate::server::deadline::Deadline;
use crate::server::handler::handle_connection;
use crate::server::router::Router;
use crate::{AppError, Result};

/// Pause after the first failed accept; doubled on each consecutive failure.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(10);
/// Upper bound on the pause between failed accepts.
const MAX_ACCEPT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// State shared by all connection tasks.
#[derive(Debug)]
pub struct ServerState {
    /// Validated server configuration.
    pub config: Arc<GlobalConfig>,
    /// Dialed-number routing table.
    pub router: Router,
}

impl ServerState {
    /// Build the shared state from a validated configuration.
    #[must_use]
    pub fn new(config: GlobalConfig) -> Self {
        let router = Router::from_config(&config);
        Self {
            config: Arc::new(config),
            router,
        }
    }

    /// Reader for the variable block honoring `max_block_bytes`.
    #[must_use]
    pub fn block_reader(&self) -> BlockReader {
        self.config
            .max_block_bytes
            .map_or_else(BlockReader::new, BlockReader::with_max_len)
    }
}

/// Bind the `FastAGI` listener on the configured address.
///
/// # Errors
///
/// Returns `AppError::Config` for an unparsable address and `AppError::Io`
/// if the socket cannot be bound.
pub async fn bind(config: &GlobalConfig) -> Result<TcpListener> {
    let addr = config.socket_addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Io(format!("failed to bind {addr}: {err}")))
}

/// Spawn the accept loop.
///
/// Runs until `ct` is cancelled. Open connections are aborted on
/// cancellation, and the returned handle resolves once they have all
/// finished.
pub fn spawn_server(
    listener: TcpListener,
    state: Arc<ServerState>,
    ct: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let local_addr = listener
        .local_addr()
        .map_or_else(|_| "unknown".to_owned(), |addr| addr.to_string());

    tokio::spawn(async move {
        let span = info_span!("agi_server", addr = %local_addr);
        async move {
            info!("FastAGI server listening");
            let tracker = TaskTracker::new();
            let mut retry_delay = ACCEPT_RETRY_DELAY;

            loop {
                tokio::select! {
                    () = ct.cancelled() => {
                        info!("FastAGI server shutting down");
                        break;
                    }
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok((stream, peer)) => {
                                retry_delay = ACCEPT_RETRY_DELAY;
                                let conn_id = uuid::Uuid::new_v4();
                                let span = info_span!("agi_conn", %peer, %conn_id);
                                debug!(parent: &span, "connection accepted");
                                tracker.spawn(
                                    serve(stream, Arc::clone(&state), ct.clone()).instrument(span),
                                );
                            }
                            Err(err) => {
                                // EMFILE and friends fail every accept until a
                                // connection closes.
                                warn!(
                                    %err,
                                    delay = ?retry_delay,
                                    "FastAGI accept failed; retrying"
                                );
                                tokio::select! {
                                    () = ct.cancelled() => {
                                        info!("FastAGI server shutting down");
                                        break;
                                    }
                                    () = tokio::time::sleep(retry_delay) => {}
                                }
                                retry_delay = next_accept_delay(retry_delay);
                            }
                        }
                    }
                }
            }

            tracker.close();
            tracker.wait().await;
            info!("FastAGI server stopped");
        }
        .instrument(span)
        .await;
    })
}

fn next_accept_delay(delay: Duration) -> Duration {
    (delay * 2).min(MAX_ACCEPT_RETRY_DELAY)
}

/// Run one connection, applying the configured deadline.
async fn serve(stream: TcpStream, state: Arc<ServerState>, ct: CancellationToken) {
    let deadline = state.config.connection_deadline();
    let exchange = async move {
        match deadline {
            Some(timeout) => handle_connection(Deadline::after(stream, timeout), state).await,
            None => handle_connection(stream, state).await,
        }
    };

    tokio::select! {
        () = ct.cancelled() => debug!("connection aborted by shutdown"),
        () = exchange => debug!("connection closed"),
    }
}
