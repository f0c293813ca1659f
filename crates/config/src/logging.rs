//! Logging configuration for the deopt CLI
//!
//! Terminal output is compact and filtered by verbosity; an optional log
//! file receives everything at debug level.

use crate::Result;
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown on the terminal
const TARGETS: [&str; 4] = ["deopt", "deopt_core", "deopt_config", "deopt_engine"];

/// Map a `-v` count to a level name
///
/// 0 → `warn`, 1 → `info`, 2 or more → `debug`
#[must_use]
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Build the terminal filter directive for a verbosity
fn directive(verbosity: u8) -> String {
    let level = level_for(verbosity);
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the logging system
///
/// `RUST_LOG` overrides the verbosity-derived filter.
///
/// # Arguments
/// * `verbosity` - Number of `-v` flags given
/// * `log_file` - Optional path to append a debug log to
///
/// # Examples
/// ```ignore
/// // Warnings only
/// init(0, None)?;
///
/// // Debug output plus a log file
/// init(2, Some(Path::new("deopt.log")))?;
/// ```
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive(verbosity)))
        .map_err(|e| deopt_core::Error::Message(format!("Invalid log filter: {e}")))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .compact()
        .with_ansi(true)
        .with_filter(env_filter);

    let file_layer = match log_file {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;

            let file_filter = EnvFilter::try_new("debug")
                .map_err(|e| deopt_core::Error::Message(format!("Invalid log filter: {e}")))?;

            Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty()
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| deopt_core::Error::Message(format!("Failed to initialize logging: {e}")))?;

    Ok(())
}
