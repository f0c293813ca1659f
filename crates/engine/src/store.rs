//! On-disk hook file
//!
//! The read-reconcile-write cycle runs under an exclusive advisory lock on a
//! sibling `.lock` file so concurrent builds in one checkout cannot lose each
//! other's updates. Writes go to a temporary file in the same directory that
//! is then renamed over the hook file; readers never see a partial file.

use crate::reconcile::reconcile;
use crate::resolver::ResolvedHookSet;
use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Outcome of [`HookFileStore::sync`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Hook file location
    pub path: PathBuf,
    /// Whether the file was rewritten
    pub changed: bool,
    /// Current file content
    pub content: String,
}

/// Hook file at a fixed location
#[derive(Debug, Clone)]
pub struct HookFileStore {
    path: PathBuf,
}

impl HookFileStore {
    /// Store for the hook file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default hook file location for a checkout
    ///
    /// Lives inside the git directory so it is per checkout and never shows
    /// up as an untracked file.
    pub fn default_path(git_dir: &Path) -> PathBuf {
        git_dir.join("deopt").join("build-hook.py")
    }

    /// Hook file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the advisory lock file
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Current content; a missing file reads as empty
    pub fn read(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(Error::HookFileRead {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Bring the hook file in line with `target`
    ///
    /// The file is written only when its declarations differ from `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HookFileParse`] if the managed section cannot be
    /// isolated; the file is left untouched in that case.
    pub fn sync(&self, target: &ResolvedHookSet) -> Result<SyncOutcome> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(|source| Error::HookFileWrite {
            path: self.path.clone(),
            source,
        })?;

        let _lock = HookFileLock::acquire(&self.lock_path())?;

        let existing = self.read()?;
        let reconciled = reconcile(&existing, target).map_err(|e| Error::HookFileParse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        if reconciled.changed {
            self.write_atomic(&reconciled.content)?;
            tracing::info!(path = %self.path.display(), entries = target.len(), "Updated hook file");
        } else {
            tracing::info!(path = %self.path.display(), "Hook file is up to date");
        }

        Ok(SyncOutcome {
            path: self.path.clone(),
            changed: reconciled.changed,
            content: reconciled.content,
        })
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn write_atomic(&self, content: &str) -> Result<()> {
        let write_err = |source| Error::HookFileWrite {
            path: self.path.clone(),
            source,
        };

        let mut temp = NamedTempFile::new_in(self.parent_dir()).map_err(write_err)?;
        if let Ok(metadata) = fs::metadata(&self.path) {
            temp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(write_err)?;
        }
        temp.write_all(content.as_bytes()).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

/// Exclusive advisory lock, released when dropped
struct HookFileLock {
    _file: File,
}

impl HookFileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_err = |source| Error::Lock {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(lock_err)?;

        #[cfg(unix)]
        rustix::fs::flock(&file, rustix::fs::FlockOperation::LockExclusive)
            .map_err(|errno| lock_err(io::Error::from(errno)))?;

        tracing::debug!(path = %path.display(), "Acquired hook file lock");
        Ok(Self { _file: file })
    }
}
