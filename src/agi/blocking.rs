//! Blocking counterparts of the AGI stream helpers.
//!
//! Same semantics as the async functions in [`crate::agi`], over
//! [`std::io::Read`] and [`std::io::Write`]. Timeouts are whatever the stream
//! enforces, e.g. [`std::net::TcpStream::set_read_timeout`]; an expired
//! timeout surfaces as `WouldBlock` or `TimedOut` depending on the platform.

use std::io::{self, Read, Write};

use tracing::trace;

use crate::agi::incomplete::Incomplete;
use crate::agi::parser::{parse_variables, Variables};
use crate::agi::reader::{closed_by_peer, Accumulator, BlockReader, READ_CHUNK_SIZE};
use crate::agi::writer::terminated;

/// Read from `stream` once and return the bytes received as text.
///
/// # Errors
///
/// Returns the stream's I/O error unchanged. A closed stream yields
/// [`io::ErrorKind::UnexpectedEof`].
pub fn read_once<R>(stream: &mut R) -> io::Result<String>
where
    R: Read + ?Sized,
{
    let mut chunk = [0_u8; READ_CHUNK_SIZE];
    let n = read_chunk(stream, &mut chunk)?;
    trace!(bytes = n, "agi: single read");
    Ok(String::from_utf8_lossy(&chunk[..n]).into_owned())
}

/// Read until the accumulated text ends with an empty line (`"\n\n"`).
///
/// # Errors
///
/// Returns [`Incomplete`] holding the text read so far when a read fails.
pub fn read_until_blank_line<R>(stream: &mut R) -> Result<String, Incomplete<String>>
where
    R: Read + ?Sized,
{
    BlockReader::new().read_block_blocking(stream)
}

/// Read the variable block and parse it.
///
/// # Errors
///
/// Returns [`Incomplete`] with the variables parsed from the partial text
/// when a read fails.
pub fn read_variables<R>(stream: &mut R) -> Result<Variables, Incomplete<Variables>>
where
    R: Read + ?Sized,
{
    BlockReader::new().read_variables_blocking(stream)
}

/// Write the bytes of `text` to `stream` with a single write call.
///
/// # Errors
///
/// Returns the stream's I/O error unchanged.
pub fn write<W>(stream: &mut W, text: &str) -> io::Result<usize>
where
    W: Write + ?Sized,
{
    let n = stream.write(text.as_bytes())?;
    trace!(bytes = n, "agi: write");
    Ok(n)
}

/// Write `text` followed by a single `\n` with one write call.
///
/// # Errors
///
/// Returns the stream's I/O error unchanged.
pub fn write_line<W>(stream: &mut W, text: &str) -> io::Result<usize>
where
    W: Write + ?Sized,
{
    write(stream, &terminated(text))
}

impl BlockReader {
    /// Blocking form of [`BlockReader::read_block`].
    ///
    /// # Errors
    ///
    /// Returns [`Incomplete`] holding the text read so far when a read fails
    /// or the size limit is exceeded.
    pub fn read_block_blocking<R>(&self, stream: &mut R) -> Result<String, Incomplete<String>>
    where
        R: Read + ?Sized,
    {
        let mut acc = Accumulator::new(self.max_len());
        let mut chunk = [0_u8; READ_CHUNK_SIZE];

        loop {
            let n = match read_chunk(stream, &mut chunk) {
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

    /// Blocking form of [`BlockReader::read_variables`].
    ///
    /// # Errors
    ///
    /// Returns [`Incomplete`] with the variables parsed from the partial
    /// text when the read fails.
    pub fn read_variables_blocking<R>(
        &self,
        stream: &mut R,
    ) -> Result<Variables, Incomplete<Variables>>
    where
        R: Read + ?Sized,
    {
        self.read_block_blocking(stream)
            .map(|text| parse_variables(&text))
            .map_err(|partial| partial.map(|text| parse_variables(&text)))
    }
}

fn read_chunk<R>(stream: &mut R, chunk: &mut [u8]) -> io::Result<usize>
where
    R: Read + ?Sized,
{
    match stream.read(chunk)? {
        0 => Err(closed_by_peer()),
        n => Ok(n),
    }
}
