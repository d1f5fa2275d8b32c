//! Asterisk Gateway Interface (AGI) stream helpers.
//!
//! When Asterisk hands a call to a `FastAGI` server it opens a TCP connection
//! and sends a block of `name: value` lines terminated by one empty line:
//!
//! ```text
//! agi_network: yes
//! agi_channel: SIP/1001-00000001
//! agi_dnid: 1234567890
//!
//! ```
//!
//! The functions here cover that exchange and nothing more:
//!
//! - [`read_once`]: one read of up to [`READ_CHUNK_SIZE`] bytes.
//! - [`read_until_blank_line`]: reads until the accumulated text ends with
//!   `"\n\n"`.
//! - [`parse_variables`]: turns a block into a [`Variables`] map.
//! - [`read_variables`]: the two combined.
//! - [`write`] / [`write_line`]: raw writes back to the peer.
//!
//! Every function borrows the stream for the duration of the call and holds
//! no state between calls. Timeouts belong to the stream: wrap it in
//! [`crate::server::deadline::Deadline`] or `tokio::time::timeout`.
//!
//! Read failures come back as [`Incomplete`], which carries whatever was
//! read before the failure alongside the unchanged [`std::io::Error`].
//!
//! The [`blocking`] submodule offers the same operations over
//! [`std::io::Read`] / [`std::io::Write`].

pub mod blocking;
pub mod incomplete;
pub mod parser;
pub mod reader;
pub mod writer;

pub use incomplete::Incomplete;
pub use parser::{parse_variables, Variables, SEPARATOR};
pub use reader::{
    read_once, read_until_blank_line, read_variables, BlockReader, READ_CHUNK_SIZE, TERMINATOR,
};
pub use writer::{write, write_line};
