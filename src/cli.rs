//! Command-line surface of the `agi-link` and `agi-link-ctl` binaries.
//!
//! The argument types live here rather than in the binaries so that
//! parsing, the `--listen` override and the variable block the ctl sends
//! can be tested like any other library code.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::agi::SEPARATOR;
use crate::config::GlobalConfig;
use crate::Result;

/// Result line `agi-link-ctl` answers with unless `--response` is given.
pub const DEFAULT_RESPONSE: &str = "200 result=0";

/// Line sent by `agi-link-ctl` when no `--var` is given, so the block is
/// never empty.
pub const FALLBACK_VARIABLE: &str = "agi_network: yes";

/// Log output format.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Arguments of the `agi-link` server.
#[derive(Debug, Parser)]
#[command(name = "agi-link", about = "Routing FastAGI server", version, long_about = None)]
pub struct ServerCli {
    /// Path to the TOML configuration file; built-in defaults when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Override the configured listen address, e.g. `127.0.0.1:4573`.
    #[arg(long)]
    pub listen: Option<String>,
}

impl ServerCli {
    /// Load the configuration named by `--config` (or the defaults) and
    /// apply `--listen`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be loaded or the
    /// resulting configuration is invalid.
    pub fn load_config(&self) -> Result<GlobalConfig> {
        let mut config = match self.config {
            Some(ref path) => GlobalConfig::load_from_path(path)?,
            None => GlobalConfig::default(),
        };
        override_listen(&mut config, self.listen.clone())?;
        Ok(config)
    }
}

/// Replace `listen_addr` and validate the result.
///
/// # Errors
///
/// Returns `AppError::Config` if the overridden configuration no longer
/// validates.
pub fn override_listen(config: &mut GlobalConfig, listen: Option<String>) -> Result<()> {
    if let Some(listen) = listen {
        config.listen_addr = listen;
        config.validate()?;
    }
    Ok(())
}

/// Arguments of `agi-link-ctl`.
#[derive(Debug, Parser)]
#[command(
    name = "agi-link-ctl",
    about = "Send a FastAGI variable block to an AGI server",
    version,
    long_about = None
)]
pub struct CtlCli {
    /// Server address.
    #[arg(long, default_value = "127.0.0.1:4573")]
    pub addr: String,

    /// Variable to send as `name=value`; may be repeated.
    ///
    /// Example: `--var agi_dnid=1234567890 --var agi_channel=SIP/1001-0001`.
    /// When none are given, `agi_network=yes` is sent so the block is never
    /// empty.
    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Result line sent back after the server's command.
    #[arg(long, default_value = DEFAULT_RESPONSE)]
    pub response: String,

    /// Read and write timeout in seconds.
    #[arg(long, default_value_t = 5)]
    pub timeout_seconds: u64,
}

/// Parse a `--var name=value` argument.
///
/// The pair must render as exactly one `name: value` line the server will
/// keep: the name must be non-empty, neither part may contain a line break,
/// and neither may contain the `": "` separator.
///
/// # Errors
///
/// Returns a message suitable for clap when the argument is rejected.
pub fn parse_var(raw: &str) -> std::result::Result<(String, String), String> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(format!("expected name=value, got '{raw}'"));
    };
    if name.is_empty() {
        return Err(format!("variable name must not be empty in '{raw}'"));
    }
    if raw.contains(['\n', '\r']) {
        return Err(format!("variable '{name}' must be a single line"));
    }
    if name.contains(SEPARATOR) || value.contains(SEPARATOR) {
        return Err(format!("variable '{name}' must not contain '{SEPARATOR}'"));
    }
    Ok((name.to_owned(), value.to_owned()))
}

/// Render `name: value` lines followed by the terminating empty line.
#[must_use]
pub fn variable_block(vars: &[(String, String)]) -> String {
    let mut block = String::new();
    if vars.is_empty() {
        block.push_str(FALLBACK_VARIABLE);
        block.push('\n');
    }
    for (name, value) in vars {
        block.push_str(name);
        block.push_str(SEPARATOR);
        block.push_str(value);
        block.push('\n');
    }
    block.push('\n');
    block
}
