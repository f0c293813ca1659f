//! XDG directory utilities
//!
//! This module provides XDG-compliant directory paths for deopt.
//! It follows the XDG Base Directory specification using the `xdg` crate:
//! - `XDG_CONFIG_HOME` defaults to ~/.config

use std::path::PathBuf;
use xdg::BaseDirectories;

/// Get the deopt config directory
///
/// Returns `$XDG_CONFIG_HOME/deopt` or `~/.config/deopt`
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    // xdg 3.0: with_prefix returns BaseDirectories, get_*_home returns Option<PathBuf>
    BaseDirectories::with_prefix("deopt").get_config_home()
}

/// Get the default config file path
///
/// Returns `$XDG_CONFIG_HOME/deopt/config.toml` or `~/.config/deopt/config.toml`
#[must_use]
pub fn default_config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
