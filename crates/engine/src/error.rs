//! Error types for deopt-engine
//!
//! Every fatal error here is raised before the hook file is written, so a
//! failed invocation never leaves a partially updated hook behind.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for deopt-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for deopt-engine
#[derive(Error, Debug)]
pub enum Error {
    /// The named base ref does not exist
    #[error("Unable to resolve '{name}' to a commit. Check the branch name or pass --base")]
    RefResolution { name: String },

    /// The two commits share no history
    #[error("Unable to determine merge base between {head} and '{base}': no common ancestor")]
    MergeBase { base: String, head: String },

    /// No base ref was configured and none of the fallbacks exist
    #[error("Unable to find a default branch (tried {})", tried.join(", "))]
    NoDefaultBranch { tried: Vec<String> },

    /// Any other version control failure
    #[error("Git error: {0}")]
    Vcs(String),

    /// The declaration section of the hook file cannot be isolated
    #[error("Hook file {} is corrupt: {reason}", path.display())]
    HookFileParse { path: PathBuf, reason: String },

    /// Error reading the hook file
    #[error("Failed to read hook file {}: {source}", path.display())]
    HookFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing the hook file
    #[error("Failed to write hook file {}: {source}", path.display())]
    HookFileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error acquiring the hook file lock
    #[error("Failed to lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Shared error
    #[error(transparent)]
    Core(#[from] deopt_core::Error),
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Vcs(err.message().to_string())
    }
}
