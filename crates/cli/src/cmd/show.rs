//! Show command implementation
//!
//! Print the directories that would be built without optimization, without
//! touching the hook file.

use clap::{Args, ValueEnum};
use deopt_engine::{HookDirectory, ResolvedHookSet, resolve_hook_set};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::command::Command;
use crate::common::{RuntimeContext, SelectionArgs};
use crate::error::Result;

/// Output format for `show`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One directory per line
    #[default]
    Simple,
    /// A JSON document with the base ref, hook file location and excluded
    /// subtrees
    Json,
}

/// Show command
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Base ref and include/ignore overrides
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Simple)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowReport<'a> {
    base_ref: &'a str,
    hook_file: PathBuf,
    #[serde(flatten)]
    set: &'a ResolvedHookSet,
}

impl Command for ShowCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let request = context.resolve_request(&self.selection)?;
        let set = resolve_hook_set(context.vcs(), &request)?;

        match self.format {
            OutputFormat::Simple => {
                if set.is_empty() {
                    eprintln!("{}", "No directories to build without optimization".dimmed());
                }
                print!("{}", render_simple(&set));
            }
            OutputFormat::Json => {
                let report = ShowReport {
                    base_ref: &request.base_ref,
                    hook_file: context.hook_store().path().to_path_buf(),
                    set: &set,
                };
                let json = serde_json::to_string_pretty(&report)
                    .map_err(|e| anyhow::anyhow!("Failed to serialize output: {e}"))?;
                println!("{json}");
            }
        }

        Ok(())
    }
}

fn render_simple(set: &ResolvedHookSet) -> String {
    set.iter()
        .map(HookDirectory::as_str)
        .fold(String::new(), |mut out, dir| {
            out.push_str(dir);
            out.push('\n');
            out
        })
}
