//! Server configuration parsing and validation.

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_listen_addr() -> String {
    "0.0.0.0:4573".into()
}

fn default_deadline_seconds() -> u64 {
    5
}

fn default_command() -> String {
    "HANGUP".into()
}

/// Global configuration parsed from `config.toml`.
///
/// Every field has a default, so an empty document is a valid config that
/// listens on the standard `FastAGI` port and hangs up every call.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct GlobalConfig {
    /// Address the `FastAGI` listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Lifetime of a connection in seconds, applied to all reads and
    /// writes on it; 0 disables the deadline.
    #[serde(default = "default_deadline_seconds")]
    pub deadline_seconds: u64,
    /// Upper bound on the size of the variable block; unbounded when absent.
    #[serde(default)]
    pub max_block_bytes: Option<usize>,
    /// Command sent when no route matches the dialed number.
    #[serde(default = "default_command")]
    pub default_command: String,
    /// Dialed number (`agi_dnid`) to AGI command.
    #[serde(default)]
    pub routes: HashMap<String, String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            deadline_seconds: default_deadline_seconds(),
            max_block_bytes: None,
            default_command: default_command(),
            routes: HashMap::new(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `listen_addr` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|err| {
            AppError::Config(format!("invalid listen_addr '{}': {err}", self.listen_addr))
        })
    }

    /// Per-connection deadline, or `None` when disabled.
    #[must_use]
    pub fn connection_deadline(&self) -> Option<Duration> {
        (self.deadline_seconds > 0).then_some(Duration::from_secs(self.deadline_seconds))
    }

    /// Check invariants that the TOML schema alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.max_block_bytes == Some(0) {
            return Err(AppError::Config(
                "max_block_bytes must be greater than zero".into(),
            ));
        }

        validate_command("default_command", &self.default_command)?;
        for (dnid, command) in &self.routes {
            validate_command(&format!("routes.{dnid}"), command)?;
        }

        Ok(())
    }
}

/// A command must be non-empty and fit on one line of the AGI stream.
fn validate_command(field: &str, command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(AppError::Config(format!("{field} must not be empty")));
    }
    if command.contains(['\n', '\r']) {
        return Err(AppError::Config(format!("{field} must be a single line")));
    }
    Ok(())
}
