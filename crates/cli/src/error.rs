//! Error types for CLI commands
//!
//! Structured errors for the failures a command can report on its own;
//! library errors are wrapped so their messages reach the user unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during command execution
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// The wrapped build tool could not be started
    #[error("Failed to run build command `{command}`: {source}")]
    BuildTool {
        /// Program that was executed
        command: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No configuration file and no terminal to ask on
    #[error("No configuration found at {}. Run `deopt configure` first", .0.display())]
    ConfigMissing(PathBuf),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] deopt_core::Error),

    /// Resolution or hook file error
    #[error(transparent)]
    Engine(#[from] deopt_engine::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;

impl CommandError {
    /// Create a `Config` error from a message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(deopt_core::Error::Config(message.into()))
    }
}
