// src/logging/logger.rs

use std::fmt::Display;
use std::sync::Arc;

use tracing::{debug, error, info, trace, warn};

use crate::errors::PipeworkError;
use crate::logging::Report;

/// Per-task logger.
///
/// Every event carries a `task` field holding the task name padded to the
/// build's widest name, so output from concurrent tasks lines up.
#[derive(Debug, Clone)]
pub struct Logger {
    task: Arc<str>,
    label: Arc<str>,
}

impl Logger {
    pub fn new(task_name: &str, width: usize) -> Self {
        Self {
            task: Arc::from(task_name),
            label: Arc::from(format!("{task_name:<width$}")),
        }
    }

    pub fn task_name(&self) -> &str {
        &self.task
    }

    pub fn trace(&self, message: impl Display) {
        trace!(task = %self.label, "{message}");
    }

    pub fn debug(&self, message: impl Display) {
        debug!(task = %self.label, "{message}");
    }

    pub fn info(&self, message: impl Display) {
        info!(task = %self.label, "{message}");
    }

    /// Info-level message that should stand out in the output.
    pub fn notice(&self, message: impl Display) {
        info!(task = %self.label, notice = true, "{message}");
    }

    pub fn warn(&self, message: impl Display) {
        warn!(task = %self.label, "{message}");
    }

    pub fn error(&self, message: impl Display) {
        error!(task = %self.label, "{message}");
    }

    /// Log `message` at error level and return the sentinel, so callers can
    /// write `return Err(run.log().fail("..."))`.
    pub fn fail(&self, message: impl Display) -> PipeworkError {
        self.error(message);
        PipeworkError::Reported
    }

    /// Log `err` unless it is the sentinel, then return the sentinel.
    pub fn report_error(&self, err: PipeworkError) -> PipeworkError {
        if !err.is_reported() {
            self.error(&err);
        }
        PipeworkError::Reported
    }

    /// Start a structured report.
    pub fn report(&self, title: impl Into<String>) -> Report {
        Report::new(self.clone(), title)
    }
}
