//! Version control abstraction layer
//!
//! The resolver only needs three questions answered by version control:
//! what commit a name points at, where two histories meet, and which files
//! differ between two points. [`VersionControl`] captures exactly that so
//! the resolver can be tested against an in-memory fake, and
//! [`Git2Provider`] answers them for a real checkout through libgit2.

use crate::{Error, Result};
use deopt_core::ChangedPath;
use git2::{Diff, DiffOptions, ErrorCode, Oid, Repository, Tree};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// An opaque commit identifier
///
/// Refs compare only by equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ref(String);

impl Ref {
    /// Wrap a commit identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version control operations needed by deopt
pub trait VersionControl {
    /// Resolve a branch, bookmark, tag or commit name to a commit
    ///
    /// # Errors
    ///
    /// Returns [`Error::RefResolution`] if the name does not exist
    fn resolve_ref(&self, name: &str) -> Result<Ref>;

    /// Most recent common ancestor of `head` and `base`
    ///
    /// # Errors
    ///
    /// Returns [`Error::MergeBase`] if the histories are unrelated
    fn merge_base(&self, head: &Ref, base: &Ref) -> Result<Ref>;

    /// Files that differ between `base` and `head`
    ///
    /// With `include_uncommitted`, staged and unstaged modifications of the
    /// working tree are reported as well.
    fn changed_paths(
        &self,
        base: &Ref,
        head: &Ref,
        include_uncommitted: bool,
    ) -> Result<BTreeSet<ChangedPath>>;

    /// Short name of the checked out branch, `None` when HEAD is detached
    fn current_branch(&self) -> Result<Option<String>>;
}

/// Version control implementation using git2 (libgit2)
pub struct Git2Provider {
    repo: Repository,
}

impl Git2Provider {
    /// Open the repository containing `path`
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not inside a git repository
    pub fn discover(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|e| {
            Error::Vcs(format!(
                "{} is not inside a git repository: {}",
                path.display(),
                e.message()
            ))
        })?;
        Ok(Self { repo })
    }

    /// Working tree root, `None` for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// The `.git` directory of this checkout
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    fn tree_of(&self, commit: &Ref) -> Result<Tree<'_>> {
        let oid = Oid::from_str(commit.as_str())?;
        Ok(self.repo.find_commit(oid)?.tree()?)
    }
}

impl VersionControl for Git2Provider {
    fn resolve_ref(&self, name: &str) -> Result<Ref> {
        let commit = self
            .repo
            .revparse_single(name)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| {
                tracing::debug!(name, error = %e, "Ref resolution failed");
                Error::RefResolution {
                    name: name.to_string(),
                }
            })?;
        Ok(Ref::new(commit.id().to_string()))
    }

    fn merge_base(&self, head: &Ref, base: &Ref) -> Result<Ref> {
        let head_oid = Oid::from_str(head.as_str())?;
        let base_oid = Oid::from_str(base.as_str())?;

        match self.repo.merge_base(head_oid, base_oid) {
            Ok(oid) => Ok(Ref::new(oid.to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Err(Error::MergeBase {
                base: base.to_string(),
                head: head.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn changed_paths(
        &self,
        base: &Ref,
        head: &Ref,
        include_uncommitted: bool,
    ) -> Result<BTreeSet<ChangedPath>> {
        let base_tree = self.tree_of(base)?;
        let head_tree = self.tree_of(head)?;
        let mut options = DiffOptions::new();
        let mut paths = BTreeSet::new();

        let committed =
            self.repo
                .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut options))?;
        collect_paths(&committed, &mut paths);

        if include_uncommitted {
            let staged = self
                .repo
                .diff_tree_to_index(Some(&base_tree), None, Some(&mut options))?;
            collect_paths(&staged, &mut paths);

            let unstaged = self
                .repo
                .diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut options))?;
            collect_paths(&unstaged, &mut paths);
        }

        tracing::debug!(count = paths.len(), %base, %head, "Collected changed paths");
        Ok(paths)
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(str::to_string))
    }
}

/// Record both sides of every delta so renames report old and new paths
fn collect_paths(diff: &Diff<'_>, paths: &mut BTreeSet<ChangedPath>) {
    for delta in diff.deltas() {
        for file in [delta.old_file(), delta.new_file()] {
            if let Some(path) = file.path() {
                paths.insert(ChangedPath::new(path.to_string_lossy().into_owned()));
            }
        }
    }
}
