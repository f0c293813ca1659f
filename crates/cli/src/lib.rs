//! deopt CLI library
//!
//! This library contains all the CLI logic for deopt, making it reusable
//! for testing and integration with other tools.

pub mod cmd;
pub mod command;
pub mod common;
pub mod error;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use deopt_config::Config;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use command::Command;
use common::RuntimeContext;
use error::CommandError;

/// deopt - build the code you touched without optimization
#[derive(Parser)]
#[command(name = "deopt")]
#[command(about = "Build the directories you changed without optimization")]
#[command(version)]
#[command(long_about = "Build the directories you changed without optimization

deopt compares your checkout with its base branch, collects the directories
containing changed files and writes them to a build hook that disables
optimization for exactly those directories. The rest of the tree keeps its
normal optimized build, so debugging your own code stays fast.

Examples:
  • deopt configure
      → Set the build configuration and base branch interactively

  • deopt mach build -j8
      → Sync the hook and run `./mach build -j8`

  • deopt mach --include dom/bindings build
      → Same, also deoptimizing dom/bindings

  • deopt show --format json
      → Print the directories without writing anything")]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the config file
    #[arg(long, env = "DEOPT_CONFIG", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "DEOPT_LOG_FILE", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for deopt CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Create or update the configuration
    Configure(cmd::configure::ConfigureCommand),

    /// Sync the build hook and run the build tool
    #[command(visible_alias = "mach")]
    Build(cmd::build::BuildCommand),

    /// Print the directories that would be built without optimization
    Show(cmd::show::ShowCommand),
}

/// Run the CLI and return the process exit code
///
/// # Errors
///
/// Returns an error if configuration, resolution or the hook file update
/// fails. A build tool that runs and fails is not an error; its exit code
/// is returned instead.
pub fn run(cli: Cli) -> Result<i32> {
    deopt_config::logging::init(cli.verbose, cli.log_file.as_deref())
        .context("Failed to initialize logging")?;

    let config_path = match cli.config {
        Some(path) => path,
        None => deopt_config::default_config_file()
            .context("Unable to determine the configuration directory")?,
    };
    tracing::debug!(path = %config_path.display(), "Using configuration file");

    match cli.command {
        Commands::Configure(command) => {
            command.run(&config_path)?;
            Ok(0)
        }
        Commands::Build(command) => {
            let Some(config) = Config::load_if_exists(&config_path)? else {
                return configure_first(&config_path);
            };
            let context = runtime_context(config, config_path)?;
            Ok(command.execute(&context)?)
        }
        Commands::Show(command) => {
            let config = Config::load_if_exists(&config_path)?.unwrap_or_default();
            let context = runtime_context(config, config_path)?;
            command.execute(&context)?;
            Ok(0)
        }
    }
}

/// Without a configuration the build only runs the interactive setup
fn configure_first(config_path: &Path) -> Result<i32> {
    if !std::io::stdin().is_terminal() {
        return Err(CommandError::ConfigMissing(config_path.to_path_buf()).into());
    }

    tracing::info!("Configuration file not found, launching interactive configuration");
    cmd::configure::ConfigureCommand::default().run(config_path)?;
    Ok(0)
}

fn runtime_context(config: Config, config_path: PathBuf) -> Result<RuntimeContext> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(RuntimeContext::new(config, config_path, &cwd)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mach_alias_and_trailing_args() {
        let cli = Cli::try_parse_from([
            "deopt", "-vv", "mach", "--base", "central", "--include", "dom,gfx", "--", "build",
            "-j8",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Build(build) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(build.selection.base.as_deref(), Some("central"));
        assert_eq!(build.selection.include, ["dom", "gfx"]);
        assert_eq!(build.args, ["build", "-j8"]);
    }

    #[test]
    fn test_mach_passes_trailing_args_without_separator() {
        let cli =
            Cli::try_parse_from(["deopt", "mach", "--ignore", "b/c", "build", "-j8", "--verbose"])
                .unwrap();
        assert_eq!(cli.verbose, 0);
        let Commands::Build(build) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(build.selection.ignore, ["b/c"]);
        assert_eq!(build.args, ["build", "-j8", "--verbose"]);
    }

    #[test]
    fn test_build_without_args() {
        let cli = Cli::try_parse_from(["deopt", "build", "--show-hook"]).unwrap();
        let Commands::Build(build) = cli.command else {
            panic!("expected build command");
        };
        assert!(build.show_hook);
        assert!(build.args.is_empty());
    }

    #[test]
    fn test_show_format() {
        let cli = Cli::try_parse_from(["deopt", "show", "--format", "json", "--ignore", "b/c"])
            .unwrap();
        let Commands::Show(show) = cli.command else {
            panic!("expected show command");
        };
        assert_eq!(show.format, cmd::show::OutputFormat::Json);
        assert_eq!(show.selection.ignore, ["b/c"]);
    }

    #[test]
    fn test_configure_repeated_options() {
        let cli = Cli::try_parse_from([
            "deopt",
            "configure",
            "--include",
            "dom",
            "--include",
            "layout",
            "--base-ref",
            "main",
        ])
        .unwrap();
        let Commands::Configure(configure) = cli.command else {
            panic!("expected configure command");
        };
        assert!(!configure.is_interactive());
        assert_eq!(configure.include, ["dom", "layout"]);
        assert_eq!(configure.base_ref.as_deref(), Some("main"));
    }
}
