//! Per-connection `FastAGI` exchange.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::agi;
use crate::server::router::DNID_VARIABLE;
use crate::server::ServerState;

/// Serve one AGI call on `stream`.
///
/// 1. Read the variable block. If the read fails, whatever variables arrived
///    are still used for routing.
/// 2. Send the routed command as one line.
/// 3. Wait for a single chunk of the PBX reply, then return; dropping the
///    stream closes the connection.
///
/// Timeouts are the stream's business: the accept loop wraps it in a
/// [`crate::server::deadline::Deadline`] when one is configured.
pub async fn handle_connection<S>(mut stream: S, state: Arc<ServerState>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let variables = match state.block_reader().read_variables(&mut stream).await {
        Ok(variables) => variables,
        Err(partial) => {
            debug!(
                error = %partial.source,
                received = partial.data.len(),
                "variable block incomplete, routing on partial variables"
            );
            partial.data
        }
    };

    let command = state.router.route(&variables);
    info!(
        dnid = variables.get(DNID_VARIABLE).map_or("", String::as_str),
        channel = variables.get("agi_channel").map_or("", String::as_str),
        command,
        "routing call"
    );

    if let Err(err) = agi::write_line(&mut stream, command).await {
        warn!(%err, "failed to send agi command");
        return;
    }

    match agi::read_once(&mut stream).await {
        Ok(reply) => debug!(reply = reply.trim_end(), "pbx replied"),
        Err(err) => debug!(%err, "no reply from pbx"),
    }
}
