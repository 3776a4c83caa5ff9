// src/run.rs

//! Per-invocation ambient context handed to task bodies and plugs.

use std::path::Path;

use crate::logging::{LogContext, Logger};
use crate::paths::AbsolutePath;

/// Marker for paths relative to the build file's directory.
pub const BUILD_DIR_MARKER: char = '@';

/// Where a running task (or plug) lives: its name, the build file that
/// defined it, and the logger for its output.
#[derive(Debug, Clone)]
pub struct Run {
    task_name: String,
    build_file: AbsolutePath,
    build_dir: AbsolutePath,
    cwd: AbsolutePath,
    log_context: LogContext,
    log: Logger,
}

impl Run {
    pub fn new(
        task_name: impl Into<String>,
        build_file: AbsolutePath,
        build_dir: AbsolutePath,
        cwd: AbsolutePath,
        log_context: LogContext,
    ) -> Self {
        let task_name = task_name.into();
        let log = log_context.logger(&task_name);
        Self {
            task_name,
            build_file,
            build_dir,
            cwd,
            log_context,
            log,
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn build_file(&self) -> &AbsolutePath {
        &self.build_file
    }

    pub fn build_dir(&self) -> &AbsolutePath {
        &self.build_dir
    }

    pub fn cwd(&self) -> &AbsolutePath {
        &self.cwd
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    /// The logging configuration this run was created with; shipped to
    /// worker threads.
    pub fn log_context(&self) -> &LogContext {
        &self.log_context
    }

    /// Resolve a path the way task bodies write them:
    ///
    /// - `""` is the working directory;
    /// - `"@sub/file"` is relative to the directory of the build file that
    ///   defined the running task (`"@"` alone is that directory);
    /// - absolute paths are only normalized;
    /// - anything else is relative to the working directory.
    pub fn resolve(&self, path: impl AsRef<str>) -> AbsolutePath {
        let path = path.as_ref();
        match path.strip_prefix(BUILD_DIR_MARKER) {
            Some(rest) => self.build_dir.join(rest.trim_start_matches(['/', '\\'])),
            None => self.cwd.join(path),
        }
    }

    /// Resolve `first` as in [`Run::resolve`], then join the remaining
    /// segments onto it.
    pub fn resolve_all<S: AsRef<str>>(&self, first: S, more: &[S]) -> AbsolutePath {
        more.iter()
            .fold(self.resolve(first), |acc, segment| {
                acc.join(Path::new(segment.as_ref()))
            })
    }
}
