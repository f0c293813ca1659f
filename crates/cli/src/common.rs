//! Common utilities and types shared across CLI commands

use crate::error::{CommandError, Result};
use clap::Args;
use deopt_config::Config;
use deopt_engine::{Git2Provider, HookFileStore, ResolveRequest, select_base_ref};
use std::path::{Path, PathBuf};

/// Per-invocation selection options shared by `build` and `show`
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Compare against this branch, bookmark or commit instead of the configured base
    #[arg(long, value_name = "REF")]
    pub base: Option<String>,

    /// Also build DIR without optimization (repeatable, comma separated)
    #[arg(long, value_name = "DIR", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Never build DIR without optimization (repeatable, comma separated)
    #[arg(long, value_name = "DIR", value_delimiter = ',')]
    pub ignore: Vec<String>,
}

/// Runtime context for CLI commands
///
/// Holds the configuration loaded once at startup and the repository the
/// command was started in. Commands receive it by reference instead of
/// reading configuration themselves.
pub struct RuntimeContext {
    /// Loaded configuration
    pub config: Config,
    /// Location the configuration was loaded from
    pub config_path: PathBuf,
    vcs: Git2Provider,
    workdir: PathBuf,
}

impl RuntimeContext {
    /// Open the repository containing `start`
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is not inside a non-bare git repository
    pub fn new(config: Config, config_path: PathBuf, start: &Path) -> Result<Self> {
        let vcs = Git2Provider::discover(start)?;
        let workdir = vcs.workdir().map(Path::to_path_buf).ok_or_else(|| {
            CommandError::Other(anyhow::anyhow!(
                "{} is a bare repository",
                vcs.git_dir().display()
            ))
        })?;

        tracing::debug!(workdir = %workdir.display(), "Opened repository");
        Ok(Self {
            config,
            config_path,
            vcs,
            workdir,
        })
    }

    /// Version control for the checkout
    #[inline]
    pub fn vcs(&self) -> &Git2Provider {
        &self.vcs
    }

    /// Working tree root
    #[inline]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Hook file store, configured or inside the git directory
    pub fn hook_store(&self) -> HookFileStore {
        let path = self
            .config
            .general
            .hook_file
            .clone()
            .unwrap_or_else(|| HookFileStore::default_path(self.vcs.git_dir()));
        HookFileStore::new(path)
    }

    /// Combine configuration and per-invocation options into a request
    ///
    /// Per-invocation include and ignore entries are appended to the
    /// configured lists.
    ///
    /// # Errors
    ///
    /// Returns an error if no base ref is given, configured or guessable
    pub fn resolve_request(&self, selection: &SelectionArgs) -> Result<ResolveRequest> {
        let base_ref = select_base_ref(
            &self.vcs,
            selection.base.as_deref(),
            self.config.base_ref(),
        )?;

        Ok(ResolveRequest {
            base_ref,
            include: self.config.include_with(&selection.include),
            ignore: self.config.ignore_with(&selection.ignore),
        })
    }
}
