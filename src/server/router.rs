//! Dialed-number routing.

use std::collections::HashMap;

use crate::agi::Variables;
use crate::config::GlobalConfig;

/// AGI variable holding the dialed number.
pub const DNID_VARIABLE: &str = "agi_dnid";

/// Maps the dialed number of a call to the AGI command sent back to the PBX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    routes: HashMap<String, String>,
    default_command: String,
}

impl Router {
    /// Build a router from `routes` (dialed number to command) and the
    /// command used when nothing matches.
    #[must_use]
    pub fn new(routes: HashMap<String, String>, default_command: impl Into<String>) -> Self {
        Self {
            routes,
            default_command: default_command.into(),
        }
    }

    /// Build a router from the `[routes]` table and `default_command`.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(config.routes.clone(), config.default_command.clone())
    }

    /// Command for a call, chosen by its [`DNID_VARIABLE`].
    ///
    /// A missing variable or an unknown number falls back to the default
    /// command.
    #[must_use]
    pub fn route(&self, variables: &Variables) -> &str {
        variables
            .get(DNID_VARIABLE)
            .and_then(|dnid| self.routes.get(dnid))
            .map_or(self.default_command.as_str(), String::as_str)
    }

    /// Command sent when no route matches.
    #[must_use]
    pub fn default_command(&self) -> &str {
        &self.default_command
    }
}
