// src/logging/mod.rs

//! Logging setup for `pipework` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `PIPEWORK_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that command stdout stays usable, or appended
//! to `--log-file` when one is given.
//!
//! Configuration is an explicit value: [`LogOptions`] is plain serde data
//! (it is copied into every worker thread), and [`LogContext`] carries it
//! through compiled builds into each [`Run`](crate::run::Run).

pub mod logger;
pub mod report;

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use tracing::Dispatch;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt;

pub use logger::Logger;
pub use report::Report;

use crate::types::LogLevel;

/// Environment variable consulted when no level is given on the CLI.
pub const LOG_ENV_VAR: &str = "PIPEWORK_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOptions {
    pub level: LogLevel,
    pub colors: bool,
    /// Width of the task-name column; the longest registered task name.
    pub task_width: usize,
    /// Append to this file instead of writing to stderr. Worker threads
    /// open it too, so every thread's output lands in one place.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            colors: false,
            task_width: 0,
            log_file: None,
        }
    }
}

impl LogOptions {
    /// Options for this process: the CLI level wins over `PIPEWORK_LOG`,
    /// colors only when stderr is a terminal.
    pub fn from_env(cli_level: Option<LogLevel>) -> Self {
        let level = match cli_level {
            Some(lvl) => lvl,
            None => std::env::var(LOG_ENV_VAR)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        };

        Self {
            level,
            colors: std::io::stderr().is_terminal(),
            task_width: 0,
            log_file: None,
        }
    }

    /// Send output to `path` (no colors) instead of stderr.
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.colors = false;
        }
        self.log_file = path;
        self
    }
}

/// Build a dispatcher for the given options without installing it.
///
/// Fails only when the log file cannot be opened.
pub fn dispatch(options: &LogOptions) -> Result<Dispatch> {
    let builder = fmt()
        .with_max_level(tracing::Level::from(options.level))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let dispatch = match &options.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Dispatch::new(
                builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .finish(),
            )
        }
        None => Dispatch::new(
            builder
                .with_ansi(options.colors)
                .with_writer(std::io::stderr)
                .finish(),
        ),
    };
    Ok(dispatch)
}

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(options: &LogOptions) -> Result<()> {
    tracing::dispatcher::set_global_default(dispatch(options)?)?;
    Ok(())
}

/// Install `options` as the subscriber for the current thread only.
///
/// Used on worker threads so their output looks like the parent's. The
/// returned guard restores the previous subscriber when dropped.
pub fn apply_in_worker(options: &LogOptions) -> Result<DefaultGuard> {
    Ok(tracing::dispatcher::set_default(&dispatch(options)?))
}

/// Logging configuration threaded through builds and runs.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    options: Arc<LogOptions>,
}

impl LogContext {
    pub fn new(options: LogOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &LogOptions {
        &self.options
    }

    /// A context whose task column fits every name in `names`.
    pub fn with_task_names<'a, I>(&self, names: I) -> LogContext
    where
        I: IntoIterator<Item = &'a str>,
    {
        let widest = names
            .into_iter()
            .map(|n| n.chars().count())
            .max()
            .unwrap_or(0);

        let mut options = (*self.options).clone();
        options.task_width = options.task_width.max(widest);
        LogContext::new(options)
    }

    /// A logger labelled with `task_name`.
    pub fn logger(&self, task_name: &str) -> Logger {
        Logger::new(task_name, self.options.task_width)
    }
}
