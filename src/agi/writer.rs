//! Async writers for AGI commands.
//!
//! Each call issues exactly one write on the stream. A short write is not
//! completed; the count the stream reports is returned as is.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Write the bytes of `text` to `stream`.
///
/// # Errors
///
/// Returns the stream's I/O error unchanged.
pub async fn write<W>(stream: &mut W, text: &str) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let n = stream.write(text.as_bytes()).await?;
    trace!(bytes = n, "agi: write");
    Ok(n)
}

/// Write `text` followed by a single `\n`, e.g. `write_line(&mut conn, "HANGUP")`.
///
/// The line is sent with one write call, so the returned count includes the
/// newline.
///
/// # Errors
///
/// Returns the stream's I/O error unchanged.
pub async fn write_line<W>(stream: &mut W, text: &str) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    write(stream, &terminated(text)).await
}

/// `text` with a trailing newline appended.
pub(crate) fn terminated(text: &str) -> String {
    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    line.push('\n');
    line
}
