//! Core types and utilities for deopt
//!
//! This is the foundation crate that all other deopt crates depend on.
//! It provides:
//! - Repository path value types ([`ChangedPath`], [`HookDirectory`])
//! - Base error types
//!
//! This crate has no dependencies on other deopt crates.

pub mod error;
pub mod path;

pub use error::{Error, Result};
pub use path::{ChangedPath, HookDirectory};
