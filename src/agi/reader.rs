//! Async readers for the AGI variable block.
//!
//! Reads are done in fixed [`READ_CHUNK_SIZE`] chunks straight from the
//! stream. There is no framing layer: the block is complete when the bytes
//! accumulated so far end with [`TERMINATOR`], regardless of how the peer
//! split them across TCP segments.
//!
//! A zero-byte read means the peer closed the connection. It is reported as
//! [`io::ErrorKind::UnexpectedEof`] so that a closed stream always ends a
//! read with an error rather than an empty success.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::agi::incomplete::Incomplete;
use crate::agi::parser::{parse_variables, Variables};

/// Size of the buffer used for every underlying read.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Suffix marking the end of the variable block: an empty line.
pub const TERMINATOR: &[u8] = b"\n\n";

/// Read from `stream` once and return the bytes received as text.
///
/// At most [`READ_CHUNK_SIZE`] bytes are consumed; a longer message is only
/// partially returned. Invalid UTF-8 is replaced rather than rejected.
///
/// # Errors
///
/// Returns the stream's I/O error unchanged, including a timeout raised by a
/// deadline on the stream. A closed stream yields
/// [`io::ErrorKind::UnexpectedEof`].
pub async fn read_once<R>(stream: &mut R) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0_u8; READ_CHUNK_SIZE];
    let n = read_chunk(stream, &mut chunk).await?;
    trace!(bytes = n, "agi: single read");
    Ok(String::from_utf8_lossy(&chunk[..n]).into_owned())
}

/// Read until the accumulated text ends with an empty line (`"\n\n"`).
///
/// Equivalent to [`BlockReader::new`]`().read_block(stream)`: the
/// accumulator is unbounded.
///
/// # Errors
///
/// Returns [`Incomplete`] holding the text read so far when a read fails.
pub async fn read_until_blank_line<R>(stream: &mut R) -> Result<String, Incomplete<String>>
where
    R: AsyncRead + Unpin,
{
    BlockReader::new().read_block(stream).await
}

/// Read the variable block and parse it.
///
/// # Errors
///
/// Returns [`Incomplete`] when a read fails. Its `data` is the parse of the
/// partial text, which may already hold some variables.
pub async fn read_variables<R>(stream: &mut R) -> Result<Variables, Incomplete<Variables>>
where
    R: AsyncRead + Unpin,
{
    BlockReader::new().read_variables(stream).await
}

/// Reader for the variable block with an optional size guard.
///
/// By default the accumulator grows without limit: a peer that never sends
/// the empty line and never closes keeps it growing until the stream's
/// deadline fires. [`BlockReader::with_max_len`] caps it instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReader {
    max_len: Option<usize>,
}

impl BlockReader {
    /// Reader with an unbounded accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self { max_len: None }
    }

    /// Reader that fails once the block would exceed `max_len` bytes.
    ///
    /// The failing call returns the bytes accumulated before the offending
    /// chunk together with an [`io::ErrorKind::InvalidData`] error.
    #[must_use]
    pub const fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
        }
    }

    /// Configured size limit, if any.
    #[must_use]
    pub const fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    /// Read chunks until the accumulated bytes end with [`TERMINATOR`].
    ///
    /// # Errors
    ///
    /// Returns [`Incomplete`] holding the text read so far when a read fails
    /// or the size limit is exceeded.
    pub async fn read_block<R>(&self, stream: &mut R) -> Result<String, Incomplete<String>>
    where
        R: AsyncRead + Unpin,
    {
        let mut acc = Accumulator::new(self.max_len);
        let mut chunk = [0_u8; READ_CHUNK_SIZE];

        loop {
            let n = match read_chunk(stream, &mut chunk).await {
                Ok(n) => n,
                Err(err) => return Err(acc.fail(err)),
            };

            match acc.push(&chunk[..n]) {
                Ok(true) => return Ok(acc.into_text()),
                Ok(false) => {}
                Err(err) => return Err(acc.fail(err)),
            }
        }
    }

    /// Read the variable block and parse it, parsing partial text on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Incomplete`] with the variables parsed from the partial
    /// text when [`BlockReader::read_block`] fails.
    pub async fn read_variables<R>(
        &self,
        stream: &mut R,
    ) -> Result<Variables, Incomplete<Variables>>
    where
        R: AsyncRead + Unpin,
    {
        self.read_block(stream)
            .await
            .map(|text| parse_variables(&text))
            .map_err(|partial| partial.map(|text| parse_variables(&text)))
    }
}

/// One read into `chunk`, with a zero-byte read mapped to `UnexpectedEof`.
async fn read_chunk<R>(stream: &mut R, chunk: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream.read(chunk).await? {
        0 => Err(closed_by_peer()),
        n => Ok(n),
    }
}

/// Error reported when a read returns no bytes.
pub(crate) fn closed_by_peer() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed by peer")
}

// ── Accumulator ───────────────────────────────────────────────────────────────

/// Growing byte buffer shared by the async and blocking block readers.
///
/// Bytes are decoded only when the read ends, so a multi-byte character
/// split across two chunks survives intact.
#[derive(Debug)]
pub(crate) struct Accumulator {
    buf: BytesMut,
    max_len: Option<usize>,
}

impl Accumulator {
    pub(crate) fn new(max_len: Option<usize>) -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            max_len,
        }
    }

    /// Append `chunk`; `Ok(true)` once the buffer ends with [`TERMINATOR`].
    pub(crate) fn push(&mut self, chunk: &[u8]) -> io::Result<bool> {
        if let Some(max) = self.max_len {
            if self.buf.len() + chunk.len() > max {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("variable block exceeds {max} bytes"),
                ));
            }
        }

        self.buf.extend_from_slice(chunk);
        trace!(
            bytes = chunk.len(),
            total = self.buf.len(),
            "agi: chunk read"
        );

        let done = self.buf.ends_with(TERMINATOR);
        if done {
            trace!(total = self.buf.len(), "agi: variable block terminated");
        }
        Ok(done)
    }

    pub(crate) fn into_text(self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }

    pub(crate) fn fail(self, source: io::Error) -> Incomplete<String> {
        Incomplete::new(self.into_text(), source)
    }
}
