//! Build command implementation
//!
//! Sync the hook file for the current checkout, then hand the remaining
//! arguments to the build tool with the hook file exported to it.

use clap::Args;
use deopt_engine::{SyncOutcome, resolve_hook_set};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

use crate::command::Command;
use crate::common::{RuntimeContext, SelectionArgs};
use crate::error::{CommandError, Result};

/// Build command
#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Build configuration file for this run only
    #[arg(long, value_name = "FILE")]
    pub build_config: Option<PathBuf>,

    /// Base ref and include/ignore overrides
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print the hook file after syncing it
    #[arg(long)]
    pub show_hook: bool,

    /// Arguments for the build tool, e.g. `deopt mach build -j8`
    ///
    /// Everything from the first positional argument on is passed through,
    /// flags included. A leading `--` is accepted as well.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Command for BuildCommand {
    /// Exit code to terminate with
    type Output = i32;

    fn execute(&self, context: &RuntimeContext) -> Result<i32> {
        let mut config = context.config.clone();
        if let Some(path) = &self.build_config {
            config.set_build_config(path)?;
        }

        let request = context.resolve_request(&self.selection)?;
        let set = resolve_hook_set(context.vcs(), &request)?;
        let outcome = context.hook_store().sync(&set)?;

        if self.show_hook {
            print_hook(&outcome);
        }

        if self.args.is_empty() {
            if !self.show_hook {
                let status = if outcome.changed { "Updated" } else { "Up to date:" };
                let noun = if set.len() == 1 { "directory" } else { "directories" };
                println!(
                    "{} {} ({} {noun})",
                    status.green(),
                    outcome.path.display().cyan(),
                    set.len()
                );
            }
            return Ok(0);
        }

        let (program, prefix) = config
            .build
            .command
            .split_first()
            .ok_or_else(|| CommandError::config("build.command is empty"))?;
        let program = program_path(program, context.workdir());
        let args: Vec<&str> = prefix
            .iter()
            .chain(&self.args)
            .map(String::as_str)
            .collect();

        let mut expression = duct::cmd(program.as_path(), &args)
            .dir(context.workdir())
            .env(&config.build.hook_env, &outcome.path);
        if let Some(build_config) = &config.general.build_config {
            expression = expression.env(&config.build.config_env, build_config);
        }

        tracing::info!(
            program = %program.display(),
            ?args,
            hook = %outcome.path.display(),
            "Running build command"
        );
        let output = expression
            .unchecked()
            .run()
            .map_err(|source| CommandError::BuildTool {
                command: program.display().to_string(),
                source,
            })?;

        let code = output.status.code().unwrap_or(1);
        tracing::debug!(code, "Build command finished");
        Ok(code)
    }
}

/// Resolve a relative program path containing a separator against `workdir`
///
/// Bare program names are left for `PATH` lookup.
fn program_path(program: &str, workdir: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        workdir.join(path)
    } else {
        path.to_path_buf()
    }
}

fn print_hook(outcome: &SyncOutcome) {
    println!("{} {}", "Hook file:".bold(), outcome.path.display().cyan());
    print!("{}", outcome.content);
    if !outcome.content.ends_with('\n') {
        println!();
    }
}
