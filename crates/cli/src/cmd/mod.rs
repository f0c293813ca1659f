//! CLI command implementations
//!
//! This module contains all command implementations for the deopt CLI.

pub mod build;
pub mod configure;
pub mod show;
