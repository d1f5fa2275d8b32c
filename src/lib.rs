#![forbid(unsafe_code)]

//! Helpers for Asterisk Gateway Interface (AGI) servers.
//!
//! [`agi`] holds the stream helpers: read the variable block Asterisk sends
//! when it opens a `FastAGI` connection, parse it, and write command lines
//! back. [`server`] is a small routing `FastAGI` server built on them, and
//! [`cli`] holds the argument types of the two binaries.

pub mod agi;
pub mod cli;
pub mod config;
pub mod errors;
pub mod server;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
