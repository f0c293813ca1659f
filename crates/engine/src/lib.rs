//! # Deopt Engine
//!
//! Core library for deopt, which builds only the code you touched without
//! optimization.
//!
//! This crate turns a checkout into a build hook file:
//!
//! - **Version control**: ref resolution, merge base and diff behind the
//!   [`VersionControl`] trait, with a libgit2 implementation
//! - **Classification**: changed files reduced to their directories
//! - **Override rules**: include and ignore lists with most-specific-wins matching
//! - **Resolution**: the pure pipeline from diff to [`ResolvedHookSet`]
//! - **Reconciliation**: idempotent regeneration of the managed hook file section
//! - **Storage**: locked, atomic writes of the hook file

pub mod classify;
pub mod error;
pub mod git;
pub mod reconcile;
pub mod resolver;
pub mod rules;
pub mod store;

pub use error::{Error, Result};

// Re-export path types from core
pub use deopt_core::{ChangedPath, HookDirectory};

// Re-export commonly used types
pub use classify::classify;
pub use git::{Git2Provider, Ref, VersionControl};
pub use reconcile::{Reconciliation, reconcile};
pub use resolver::{ResolveRequest, ResolvedHookSet, resolve_hook_set, select_base_ref};
pub use store::{HookFileStore, SyncOutcome};
