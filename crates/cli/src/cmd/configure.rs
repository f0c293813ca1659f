//! Configure command implementation
//!
//! Create or update the deopt configuration file. Without options the
//! values are asked for interactively; with any option the remaining values
//! keep their current setting or fall back to defaults.

use anyhow::Context;
use clap::Args;
use deopt_config::Config;
use deopt_config::config::{DEFAULT_BASE_REF, parse_list};
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Build configuration used when none is given or configured
const DEFAULT_BUILD_CONFIG: &str = "~/mozconfig";

/// Configure command
#[derive(Debug, Default, Args)]
pub struct ConfigureCommand {
    /// Build configuration file handed to the build (default: ~/mozconfig)
    #[arg(long, value_name = "FILE")]
    pub build_config: Option<PathBuf>,

    /// Branch, bookmark or commit to compare against (default: bookmarks/central)
    #[arg(long, value_name = "REF")]
    pub base_ref: Option<String>,

    /// Directories always built without optimization (repeatable, comma separated)
    #[arg(long, value_name = "DIR", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Directories never built without optimization (repeatable, comma separated)
    #[arg(long, value_name = "DIR", value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Hook file location (default: inside the checkout's git directory)
    #[arg(long, value_name = "FILE")]
    pub hook_file: Option<PathBuf>,
}

impl ConfigureCommand {
    /// Whether no option was given, so values are prompted for
    pub fn is_interactive(&self) -> bool {
        self.build_config.is_none()
            && self.base_ref.is_none()
            && self.include.is_empty()
            && self.ignore.is_empty()
            && self.hook_file.is_none()
    }

    /// Run the command and save the result to `config_path`
    pub fn run(&self, config_path: &Path) -> Result<()> {
        let existing = Config::load_if_exists(config_path)?.unwrap_or_default();

        let config = if self.is_interactive() {
            let Some(config) = prompt(existing, config_path)? else {
                println!("Cancelled.");
                return Ok(());
            };
            config
        } else {
            self.apply(existing)?
        };

        config.save(config_path)?;
        println!(
            "{} {}",
            "Saved configuration to".green(),
            config_path.display().cyan()
        );
        describe(&config);
        Ok(())
    }

    /// Apply the given options on top of `config`
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given build configuration file does
    /// not exist.
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        match &self.build_config {
            Some(path) => {
                config.set_build_config(path)?;
            }
            None if config.general.build_config.is_none() => {
                if let Err(e) = config.set_build_config(Path::new(DEFAULT_BUILD_CONFIG)) {
                    tracing::warn!(error = %e, "No build configuration set");
                }
            }
            None => {}
        }

        match self.base_ref.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => config.general.base_ref = Some(base.to_string()),
            _ if config.base_ref().is_none() => {
                config.general.base_ref = Some(DEFAULT_BASE_REF.to_string());
            }
            _ => {}
        }

        if !self.include.is_empty() {
            config.paths.include = clean(&self.include);
        }
        if !self.ignore.is_empty() {
            config.paths.ignore = clean(&self.ignore);
        }

        if let Some(hook_file) = &self.hook_file {
            config.set_hook_file(hook_file)?;
        }

        Ok(config)
    }
}

fn clean(items: &[String]) -> Vec<String> {
    items.iter().flat_map(|item| parse_list(item)).collect()
}

/// Ask for every value, starting from the current configuration
///
/// Returns `None` if the user declines to save.
fn prompt(mut config: Config, config_path: &Path) -> anyhow::Result<Option<Config>> {
    let theme = ColorfulTheme::default();

    let current_build_config = config
        .general
        .build_config
        .as_ref()
        .map_or_else(|| DEFAULT_BUILD_CONFIG.to_string(), |p| p.display().to_string());
    let build_config: String = Input::with_theme(&theme)
        .with_prompt("Build configuration file")
        .default(current_build_config)
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            Config::default()
                .set_build_config(Path::new(input))
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .context("Failed to read build configuration file")?;
    config.set_build_config(Path::new(&build_config))?;

    let current_base = config.base_ref().unwrap_or(DEFAULT_BASE_REF).to_string();
    let base_ref: String = Input::with_theme(&theme)
        .with_prompt("Base branch, bookmark or commit")
        .default(current_base)
        .interact_text()
        .context("Failed to read base ref")?;
    config.general.base_ref = Some(base_ref.trim().to_string());

    let include: String = Input::with_theme(&theme)
        .with_prompt("Always build without optimization (comma separated)")
        .default(config.paths.include.join(", "))
        .allow_empty(true)
        .interact_text()
        .context("Failed to read include list")?;
    config.paths.include = parse_list(&include);

    let ignore: String = Input::with_theme(&theme)
        .with_prompt("Never build without optimization (comma separated)")
        .default(config.paths.ignore.join(", "))
        .allow_empty(true)
        .interact_text()
        .context("Failed to read ignore list")?;
    config.paths.ignore = parse_list(&ignore);

    println!();
    describe(&config);
    let confirmed = Confirm::with_theme(&theme)
        .with_prompt(format!("Save to {}?", config_path.display()))
        .default(true)
        .interact()
        .context("Failed to read confirmation")?;

    Ok(confirmed.then_some(config))
}

fn describe(config: &Config) {
    let path_or_dash = |path: Option<&Path>| {
        path.map_or_else(|| "-".to_string(), |p| p.display().to_string())
    };
    let list_or_dash = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };

    println!("  {:<12} {}", "baseRef".bold(), config.base_ref().unwrap_or("-"));
    println!(
        "  {:<12} {}",
        "buildConfig".bold(),
        path_or_dash(config.general.build_config.as_deref())
    );
    println!(
        "  {:<12} {}",
        "hookFile".bold(),
        path_or_dash(config.general.hook_file.as_deref())
    );
    println!("  {:<12} {}", "include".bold(), list_or_dash(&config.paths.include));
    println!("  {:<12} {}", "ignore".bold(), list_or_dash(&config.paths.ignore));
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn existing_build_config(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("mozconfig");
        fs::write(&path, "ac_add_options --enable-debug\n").unwrap();
        path
    }

    #[test]
    fn test_no_options_is_interactive() {
        assert!(ConfigureCommand::default().is_interactive());
        let cmd = ConfigureCommand {
            include: vec!["dom".to_string()],
            ..ConfigureCommand::default()
        };
        assert!(!cmd.is_interactive());
    }

    #[test]
    fn test_apply_explicit_values() {
        let temp = TempDir::new().unwrap();
        let build_config = existing_build_config(&temp);
        let cmd = ConfigureCommand {
            build_config: Some(build_config.clone()),
            base_ref: Some("main".to_string()),
            include: vec!["dom/base, gfx".to_string(), "layout".to_string()],
            ignore: vec!["third_party".to_string()],
            hook_file: Some(temp.path().join("hook.py")),
        };

        let config = cmd.apply(Config::default()).unwrap();
        assert_eq!(config.base_ref(), Some("main"));
        assert_eq!(
            config.general.build_config,
            Some(fs::canonicalize(&build_config).unwrap())
        );
        assert_eq!(config.paths.include, ["dom/base", "gfx", "layout"]);
        assert_eq!(config.paths.ignore, ["third_party"]);
        assert_eq!(config.general.hook_file, Some(temp.path().join("hook.py")));
    }

    #[test]
    fn test_apply_defaults_base_ref_and_keeps_lists() {
        let mut existing = Config::default();
        existing.general.build_config = Some(PathBuf::from("/somewhere/mozconfig"));
        existing.paths.include = vec!["gfx".to_string()];

        let cmd = ConfigureCommand {
            ignore: vec!["testing".to_string()],
            ..ConfigureCommand::default()
        };
        let config = cmd.apply(existing).unwrap();
        assert_eq!(config.base_ref(), Some(DEFAULT_BASE_REF));
        assert_eq!(
            config.general.build_config.as_deref(),
            Some(Path::new("/somewhere/mozconfig"))
        );
        assert_eq!(config.paths.include, ["gfx"]);
        assert_eq!(config.paths.ignore, ["testing"]);
    }

    #[test]
    fn test_apply_keeps_configured_base_ref() {
        let mut existing = Config::default();
        existing.general.base_ref = Some("central".to_string());
        existing.general.build_config = Some(PathBuf::from("/somewhere/mozconfig"));

        let cmd = ConfigureCommand {
            base_ref: Some("   ".to_string()),
            ..ConfigureCommand::default()
        };
        assert_eq!(cmd.apply(existing).unwrap().base_ref(), Some("central"));
    }

    #[test]
    fn test_apply_missing_build_config_fails() {
        let temp = TempDir::new().unwrap();
        let cmd = ConfigureCommand {
            build_config: Some(temp.path().join("missing")),
            ..ConfigureCommand::default()
        };
        let err = cmd.apply(Config::default()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_run_writes_config_file() {
        let temp = TempDir::new().unwrap();
        let build_config = existing_build_config(&temp);
        let config_path = temp.path().join("deopt/config.toml");

        let cmd = ConfigureCommand {
            build_config: Some(build_config),
            base_ref: Some("central".to_string()),
            ..ConfigureCommand::default()
        };
        cmd.run(&config_path).unwrap();

        let saved = Config::load(&config_path).unwrap();
        assert_eq!(saved.base_ref(), Some("central"));
        assert!(saved.general.build_config.is_some());
    }
}
