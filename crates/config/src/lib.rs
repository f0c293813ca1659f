//! Configuration management for deopt
//!
//! This crate handles:
//! - Configuration loading, saving and validation
//! - XDG directory management
//! - Logging initialization

pub mod config;
pub mod dirs;
pub mod logging;

// Re-export error types from core
pub use deopt_core::{Error, Result};

// Re-export main types
pub use config::{BuildConfig, Config, GeneralConfig, PathsConfig};
pub use dirs::{config_dir, default_config_file};
