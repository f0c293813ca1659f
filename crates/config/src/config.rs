//! Configuration management
//!
//! This module handles loading and saving the deopt configuration file.
//!
//! ```toml
//! [general]
//! baseRef = "bookmarks/central"
//! buildConfig = "~/mozconfig"
//!
//! [paths]
//! include = ["dom/base"]
//! ignore = ["third_party"]
//!
//! [build]
//! command = ["./mach"]
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Base ref used when `configure` runs without an explicit one
pub const DEFAULT_BASE_REF: &str = "bookmarks/central";

/// General configuration section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Branch, bookmark or commit the working tree is compared against
    #[serde(default, rename = "baseRef", skip_serializing_if = "Option::is_none")]
    pub base_ref: Option<String>,

    /// Build-tool configuration file handed to the build via `build.configEnv`
    #[serde(
        default,
        rename = "buildConfig",
        skip_serializing_if = "Option::is_none"
    )]
    pub build_config: Option<PathBuf>,

    /// Location of the generated hook file
    ///
    /// Defaults to `<git dir>/deopt/build-hook.py` of the current checkout.
    #[serde(default, rename = "hookFile", skip_serializing_if = "Option::is_none")]
    pub hook_file: Option<PathBuf>,
}

/// Default include and ignore lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directories that are always built without optimization
    #[serde(default)]
    pub include: Vec<String>,

    /// Directories that are never built without optimization
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// How the wrapped build tool is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Program and leading arguments, run from the repository root
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,

    /// Environment variable that receives the hook file path
    #[serde(default = "default_hook_env", rename = "hookEnv")]
    pub hook_env: String,

    /// Environment variable that receives `general.buildConfig`
    #[serde(default = "default_config_env", rename = "configEnv")]
    pub config_env: String,
}

fn default_build_command() -> Vec<String> {
    vec!["./mach".to_string()]
}

fn default_hook_env() -> String {
    "MOZ_BUILD_HOOK".to_string()
}

fn default_config_env() -> String {
    "MOZCONFIG".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            hook_env: default_hook_env(),
            config_env: default_config_env(),
        }
    }
}

/// deopt configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General configuration section
    #[serde(default)]
    pub general: GeneralConfig,

    /// Include and ignore lists
    #[serde(default)]
    pub paths: PathsConfig,

    /// Build tool invocation
    #[serde(default)]
    pub build: BuildConfig,
}

impl Config {
    /// Load configuration from a file
    ///
    /// Relative paths inside the file resolve against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or TOML parsing fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            deopt_core::Error::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, base_dir)
    }

    /// Load configuration from a file if it exists
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load_if_exists<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing fails
    pub fn from_toml_str(toml_content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(toml_content).map_err(|e| {
            deopt_core::Error::Config(format!("Failed to parse config TOML: {e}"))
        })?;

        config.resolve_relative_paths(base_dir);
        config.paths.include = clean_list(config.paths.include);
        config.paths.ignore = clean_list(config.paths.ignore);

        Ok(config)
    }

    /// Save configuration to a file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file write fails
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| {
            deopt_core::Error::Config(format!("Failed to serialize config: {e}"))
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                deopt_core::Error::Config(format!(
                    "Failed to create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            deopt_core::Error::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })?;

        tracing::debug!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Set the build configuration file
    ///
    /// The path is expanded and canonicalized; the stored value is always
    /// absolute.
    ///
    /// # Errors
    ///
    /// Returns error if the file does not exist
    pub fn set_build_config(&mut self, path: &Path) -> Result<&Path> {
        let cwd = std::env::current_dir()?;
        let expanded = resolve_path(path, &cwd);
        let canonical = fs::canonicalize(&expanded).map_err(|_| {
            deopt_core::Error::Config(format!(
                "The build configuration file {} does not exist",
                expanded.display()
            ))
        })?;

        let stored = self.general.build_config.insert(canonical);
        Ok(stored.as_path())
    }

    /// Set the hook file location
    ///
    /// The file does not need to exist yet; relative paths resolve against
    /// the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if the current directory cannot be determined
    pub fn set_hook_file(&mut self, path: &Path) -> Result<&Path> {
        let cwd = std::env::current_dir()?;
        let stored = self.general.hook_file.insert(resolve_path(path, &cwd));
        Ok(stored.as_path())
    }

    /// Configured base ref, if any
    pub fn base_ref(&self) -> Option<&str> {
        self.general
            .base_ref
            .as_deref()
            .filter(|r| !r.trim().is_empty())
    }

    /// Configured include list followed by `extra`
    pub fn include_with(&self, extra: &[String]) -> Vec<String> {
        merge_lists(&self.paths.include, extra)
    }

    /// Configured ignore list followed by `extra`
    pub fn ignore_with(&self, extra: &[String]) -> Vec<String> {
        merge_lists(&self.paths.ignore, extra)
    }

    fn resolve_relative_paths(&mut self, base_dir: &Path) {
        if let Some(ref build_config) = self.general.build_config {
            self.general.build_config = Some(resolve_path(build_config, base_dir));
        }
        if let Some(ref hook_file) = self.general.hook_file {
            self.general.hook_file = Some(resolve_path(hook_file, base_dir));
        }
    }
}

/// Resolve a single path: expand `~/` and resolve relative paths
fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(stripped) = path_str.strip_prefix("~/") {
        if let Some(home) = ::dirs::home_dir() {
            return home.join(stripped);
        }
    } else if path_str == "~"
        && let Some(home) = ::dirs::home_dir()
    {
        return home;
    }

    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Split a comma separated list as typed at a prompt
///
/// ```
/// use deopt_config::config::parse_list;
///
/// assert_eq!(parse_list(" dom/base, ,layout "), vec!["dom/base", "layout"]);
/// ```
pub fn parse_list(input: &str) -> Vec<String> {
    clean_list(input.split(',').map(str::to_string).collect())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn merge_lists(configured: &[String], extra: &[String]) -> Vec<String> {
    let mut merged = configured.to_vec();
    for item in clean_list(extra.to_vec()) {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use tempfile::TempDir;

    fn create_test_config(toml_content: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, toml_content).unwrap();
        (temp_dir, config_path)
    }

    #[test]
    fn test_build_config_defaults() {
        let build = BuildConfig::default();
        assert_eq!(build.command, vec!["./mach"]);
        assert_eq!(build.hook_env, "MOZ_BUILD_HOOK");
        assert_eq!(build.config_env, "MOZCONFIG");
    }

    #[test]
    fn test_load_empty_config() {
        let (_temp_dir, config_path) = create_test_config("");
        let config = Config::load(&config_path).unwrap();

        assert_eq!(config, Config::default());
        assert!(config.base_ref().is_none());
    }

    #[test]
    fn test_load_full_config() {
        let toml = r#"
[general]
baseRef = "central"
buildConfig = "/opt/mozconfig"
hookFile = "hooks/noopt.py"

[paths]
include = ["dom/base", "  "]
ignore = ["third_party"]

[build]
command = ["python3", "mach"]
hookEnv = "HOOK"
"#;
        let (temp_dir, config_path) = create_test_config(toml);
        let config = Config::load(&config_path).unwrap();

        assert_eq!(config.base_ref(), Some("central"));
        assert_eq!(
            config.general.build_config,
            Some(PathBuf::from("/opt/mozconfig"))
        );
        assert_eq!(
            config.general.hook_file,
            Some(temp_dir.path().join("hooks/noopt.py"))
        );
        assert_eq!(config.paths.include, vec!["dom/base"]);
        assert_eq!(config.paths.ignore, vec!["third_party"]);
        assert_eq!(config.build.command, vec!["python3", "mach"]);
        assert_eq!(config.build.hook_env, "HOOK");
        assert_eq!(config.build.config_env, "MOZCONFIG");
    }

    #[test]
    fn test_blank_base_ref_is_unset() {
        let config =
            Config::from_toml_str("[general]\nbaseRef = \" \"\n", Path::new("/")).unwrap();
        assert!(config.base_ref().is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let (_temp_dir, config_path) = create_test_config("[general\n");
        let err = Config::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config TOML"));
    }

    #[test]
    fn test_load_if_exists_missing() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::load_if_exists(temp_dir.path().join("nope.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_resolve_tilde_path() {
        let home = ::dirs::home_dir().unwrap();
        let resolved = resolve_path(Path::new("~/mozconfig"), Path::new("/base"));
        assert_eq!(resolved, home.join("mozconfig"));
    }

    #[test]
    fn test_resolve_relative_and_absolute_path() {
        assert_eq!(
            resolve_path(Path::new("sub/file"), Path::new("/base")),
            PathBuf::from("/base/sub/file")
        );
        assert_eq!(
            resolve_path(Path::new("/abs/file"), Path::new("/base")),
            PathBuf::from("/abs/file")
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.general.base_ref = Some("main".to_string());
        config.paths.include = vec!["a".to_string()];
        config.paths.ignore = vec!["b/c".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_set_build_config_requires_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();

        let missing = temp_dir.path().join("missing");
        let err = config.set_build_config(&missing).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(config.general.build_config.is_none());

        let present = temp_dir.path().join("mozconfig");
        fs::write(&present, "ac_add_options --enable-debug\n").unwrap();
        let stored = config.set_build_config(&present).unwrap().to_path_buf();
        assert!(stored.is_absolute());
        assert_eq!(stored, fs::canonicalize(&present).unwrap());
    }

    #[test]
    fn test_set_hook_file_need_not_exist() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();

        let hook = temp_dir.path().join("not/yet/hook.py");
        let stored = config.set_hook_file(&hook).unwrap().to_path_buf();
        assert_eq!(stored, hook);
        assert_eq!(config.general.hook_file.as_deref(), Some(hook.as_path()));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b/c ,,"), vec!["a", "b/c"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_lists_with_extras_keep_order_and_dedupe() {
        let mut config = Config::default();
        config.paths.include = vec!["a".to_string(), "b".to_string()];
        config.paths.ignore = vec!["x".to_string()];

        let include = config.include_with(&["b".to_string(), " c ".to_string()]);
        assert_eq!(include, vec!["a", "b", "c"]);

        let ignore = config.ignore_with(&[]);
        assert_eq!(ignore, vec!["x"]);
    }
}
