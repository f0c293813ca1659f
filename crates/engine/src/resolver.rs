//! Hook set resolution
//!
//! Turns "what did I change since I branched off" into the set of
//! directories to build without optimization. All version control access
//! goes through [`VersionControl`]; everything after the diff is pure.

use crate::classify::classify;
use crate::git::VersionControl;
use crate::rules::OverrideRules;
use crate::{Error, Result};
use deopt_core::{ChangedPath, HookDirectory};
use serde::Serialize;
use std::collections::BTreeSet;

/// Branches tried, in order, when no base ref is configured
pub const FALLBACK_BRANCHES: [&str; 2] = ["main", "master"];

/// Inputs for one resolution
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    /// Name of the branch, bookmark or commit to compare against
    pub base_ref: String,
    /// Directories that are always part of the result
    pub include: Vec<String>,
    /// Directories removed from the result unless a deeper include wins
    pub ignore: Vec<String>,
}

/// Final set of directories to build without optimization
///
/// Every directory stands for its whole subtree. `excluded` holds the ignored
/// directories that sit below one of them and must stay optimized. Iteration
/// order is lexicographic by normalized path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedHookSet {
    directories: BTreeSet<HookDirectory>,
    excluded: BTreeSet<HookDirectory>,
}

impl ResolvedHookSet {
    /// Create a set from directories
    pub fn new(dirs: impl IntoIterator<Item = HookDirectory>) -> Self {
        Self {
            directories: dirs.into_iter().collect(),
            excluded: BTreeSet::new(),
        }
    }

    /// Carve `excluded` subtrees out of the directories
    #[must_use]
    pub fn with_excluded(mut self, excluded: impl IntoIterator<Item = HookDirectory>) -> Self {
        self.excluded = excluded.into_iter().collect();
        self
    }

    /// Iterate over the directories in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &HookDirectory> {
        self.directories.iter()
    }

    /// Iterate over the excluded subtrees in sorted order
    pub fn excluded(&self) -> impl Iterator<Item = &HookDirectory> {
        self.excluded.iter()
    }

    /// Number of directories
    pub fn len(&self) -> usize {
        self.directories.len()
    }

    /// Whether the set has no directories
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    /// Whether `dir` is one of the directories
    pub fn contains(&self, dir: &HookDirectory) -> bool {
        self.directories.contains(dir)
    }

    /// Whether a build in `dir` runs without optimization
    ///
    /// The deepest matching entry decides; a directory and an exclusion of
    /// equal depth cannot both match since they would be equal.
    pub fn deoptimizes(&self, dir: &HookDirectory) -> bool {
        let deepest = |set: &BTreeSet<HookDirectory>| {
            set.iter()
                .filter(|entry| entry.covers(dir))
                .map(HookDirectory::depth)
                .max()
        };

        match (deepest(&self.directories), deepest(&self.excluded)) {
            (Some(kept), Some(excluded)) => kept >= excluded,
            (kept, _) => kept.is_some(),
        }
    }
}

impl From<BTreeSet<HookDirectory>> for ResolvedHookSet {
    fn from(directories: BTreeSet<HookDirectory>) -> Self {
        Self {
            directories,
            excluded: BTreeSet::new(),
        }
    }
}

impl<'a> IntoIterator for &'a ResolvedHookSet {
    type Item = &'a HookDirectory;
    type IntoIter = std::collections::btree_set::Iter<'a, HookDirectory>;

    fn into_iter(self) -> Self::IntoIter {
        self.directories.iter()
    }
}

/// Reduce changed files to candidate hook directories
///
/// Unclassifiable paths are dropped and duplicates collapse.
pub fn candidates<'a>(paths: impl IntoIterator<Item = &'a ChangedPath>) -> BTreeSet<HookDirectory> {
    paths.into_iter().filter_map(classify).collect()
}

/// Resolve the hook set for the current checkout
///
/// Nothing is written; on error no partial result is produced.
///
/// # Errors
///
/// - [`Error::RefResolution`] if `request.base_ref` does not exist
/// - [`Error::MergeBase`] if HEAD and the base share no history
/// - [`Error::Vcs`] if HEAD has no commits yet, or for any other version
///   control failure
pub fn resolve_hook_set(
    vcs: &dyn VersionControl,
    request: &ResolveRequest,
) -> Result<ResolvedHookSet> {
    let head = vcs.resolve_ref("HEAD").map_err(|e| match e {
        Error::RefResolution { .. } => {
            Error::Vcs("HEAD has no commits yet; commit before building".to_string())
        }
        other => other,
    })?;
    let base = vcs.resolve_ref(&request.base_ref)?;

    let merge_base = vcs.merge_base(&head, &base).map_err(|e| match e {
        Error::MergeBase { .. } => Error::MergeBase {
            base: request.base_ref.clone(),
            head: "HEAD".to_string(),
        },
        other => other,
    })?;
    tracing::info!(base = %request.base_ref, %merge_base, "Found merge base");

    let changed = vcs.changed_paths(&merge_base, &head, true)?;
    let candidate_set = candidates(&changed);
    tracing::debug!(
        changed = changed.len(),
        candidates = candidate_set.len(),
        "Classified changed paths"
    );

    let rules = OverrideRules::new(request.include.as_slice(), request.ignore.as_slice());
    let resolved = rules.apply(&candidate_set);
    let excluded = rules.exclusions(&resolved);
    tracing::info!(
        count = resolved.len(),
        excluded = excluded.len(),
        "Resolved hook directories"
    );

    Ok(ResolvedHookSet::from(resolved).with_excluded(excluded))
}

/// Pick the ref to compare against
///
/// A non-empty `override_ref` wins, then `configured`, then the first of
/// [`FALLBACK_BRANCHES`] that exists. When the checkout sits on the chosen
/// branch itself, its upstream `origin/<branch>` is used instead.
///
/// # Errors
///
/// Returns [`Error::NoDefaultBranch`] if nothing is configured and no
/// fallback branch exists.
pub fn select_base_ref(
    vcs: &dyn VersionControl,
    override_ref: Option<&str>,
    configured: Option<&str>,
) -> Result<String> {
    if let Some(name) = override_ref.map(str::trim).filter(|s| !s.is_empty()) {
        tracing::debug!(base = name, "Using base ref from command line");
        return Ok(name.to_string());
    }

    let branch = match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.to_string(),
        None => FALLBACK_BRANCHES
            .iter()
            .find(|name| vcs.resolve_ref(name).is_ok())
            .map(|name| (*name).to_string())
            .ok_or_else(|| Error::NoDefaultBranch {
                tried: FALLBACK_BRANCHES.iter().map(ToString::to_string).collect(),
            })?,
    };

    if vcs.current_branch()?.as_deref() == Some(branch.as_str()) {
        let upstream = format!("origin/{branch}");
        tracing::info!(%branch, %upstream, "On the base branch, comparing against upstream");
        return Ok(upstream);
    }

    tracing::debug!(base = %branch, "Selected base ref");
    Ok(branch)
}
