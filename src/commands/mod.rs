//! Command handlers for the fintrack CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod chat;
mod init;
mod report;

use crate::error::{Error, ErrorType};
use crate::Config;
use anyhow::anyhow;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use add::add;
pub use chat::chat;
pub use init::init;
pub use report::report;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data that is logged at debug level.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Picks the user a command acts for: the one given on the command line, otherwise the
/// `default_user_id` from the config file.
fn resolve_user(config: &Config, user: Option<i64>) -> crate::Result<i64> {
    user.or(config.default_user_id()).ok_or_else(|| {
        Error::new(
            ErrorType::Input,
            anyhow!("No user given. Pass --user or set default_user_id in config.json"),
        )
    })
}
