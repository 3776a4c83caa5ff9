// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::DEFAULT_BUILD_FILE;
use crate::types::LogLevel;

/// Task invoked when none is named on the command line.
pub const DEFAULT_TASK: &str = "default";

/// Command-line arguments for `pipework`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipework",
    version,
    about = "Run memoized build tasks defined in a TOML build file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the build file (TOML).
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_BUILD_FILE)]
    pub file: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEWORK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Append logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Give up on the whole invocation after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Parse + validate, print the tasks, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Tasks to invoke, in order. Defaults to `default`.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,
}

impl CliArgs {
    /// The tasks to run, falling back to [`DEFAULT_TASK`].
    pub fn task_names(&self) -> Vec<String> {
        if self.tasks.is_empty() {
            vec![DEFAULT_TASK.to_string()]
        } else {
            self.tasks.clone()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
