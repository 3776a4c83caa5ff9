// src/logging/report.rs

use std::fmt;
use std::path::PathBuf;

use crate::errors::{PipeworkError, Result};
use crate::logging::Logger;
use crate::types::LogLevel;

/// One entry of a [`Report`].
#[derive(Debug, Clone)]
pub struct Annotation {
    pub level: LogLevel,
    pub message: String,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{line}: {}", file.display(), self.message),
            (Some(file), None) => write!(f, "{}: {}", file.display(), self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Collects findings from a stage (lint warnings, failed assertions...) and
/// emits them together.
#[derive(Debug)]
pub struct Report {
    log: Logger,
    title: String,
    annotations: Vec<Annotation>,
}

impl Report {
    pub(crate) fn new(log: Logger, title: impl Into<String>) -> Self {
        Self {
            log,
            title: title.into(),
            annotations: Vec::new(),
        }
    }

    pub fn add(&mut self, level: LogLevel, message: impl Into<String>) -> &mut Self {
        self.annotations.push(Annotation {
            level,
            message: message.into(),
            file: None,
            line: None,
        });
        self
    }

    pub fn add_at(
        &mut self,
        level: LogLevel,
        file: impl Into<PathBuf>,
        line: Option<u32>,
        message: impl Into<String>,
    ) -> &mut Self {
        self.annotations.push(Annotation {
            level,
            message: message.into(),
            file: Some(file.into()),
            line,
        });
        self
    }

    pub fn errors(&self) -> usize {
        self.count(LogLevel::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(LogLevel::Warn)
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    fn count(&self, level: LogLevel) -> usize {
        self.annotations.iter().filter(|a| a.level == level).count()
    }

    /// Emit the report. Fails with the sentinel if any entry is an error,
    /// since every error has just been logged.
    pub fn done(self) -> Result<()> {
        if self.annotations.is_empty() {
            return Ok(());
        }

        let errors = self.errors();
        let warnings = self.warnings();
        self.log.notice(format_args!(
            "{}: {errors} error(s), {warnings} warning(s)",
            self.title
        ));

        for annotation in &self.annotations {
            match annotation.level {
                LogLevel::Error => self.log.error(annotation),
                LogLevel::Warn => self.log.warn(annotation),
                LogLevel::Info => self.log.info(annotation),
                LogLevel::Debug => self.log.debug(annotation),
                LogLevel::Trace => self.log.trace(annotation),
            }
        }

        if errors > 0 {
            Err(PipeworkError::Reported)
        } else {
            Ok(())
        }
    }
}
