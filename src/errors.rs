// src/errors.rs

//! Crate-wide error type.
//!
//! Errors must be `Clone`: a failed task body is cached inside a shared
//! future, and every dependent in the same invocation observes the same
//! failure.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PipeworkError {
    /// The failure was already logged where it happened; do not print it again.
    #[error("build failed")]
    Reported,

    #[error("circular invocation: {}", chain.join(" -> "))]
    CircularInvocation { chain: Vec<String> },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("path {path:?} is not a descendant of {directory:?}")]
    PathOutsideDirectory { path: PathBuf, directory: PathBuf },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("files builder was already built")]
    BuilderFrozen,

    #[error("no files to pipe into {stage}")]
    NoFiles { stage: String },

    #[error("worker exited with code {0}")]
    WorkerExit(i32),

    #[error("worker transport failure: {0}")]
    WorkerTransport(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),

    #[error("TOML parsing error: {0}")]
    Toml(Arc<toml::de::Error>),

    #[error("glob error: {0}")]
    Glob(Arc<globset::Error>),

    #[error("{0:#}")]
    Other(Arc<anyhow::Error>),
}

impl PipeworkError {
    /// True for the "already reported" sentinel.
    pub fn is_reported(&self) -> bool {
        matches!(self, PipeworkError::Reported)
    }
}

impl From<std::io::Error> for PipeworkError {
    fn from(err: std::io::Error) -> Self {
        PipeworkError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for PipeworkError {
    fn from(err: serde_json::Error) -> Self {
        PipeworkError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for PipeworkError {
    fn from(err: toml::de::Error) -> Self {
        PipeworkError::Toml(Arc::new(err))
    }
}

impl From<globset::Error> for PipeworkError {
    fn from(err: globset::Error) -> Self {
        PipeworkError::Glob(Arc::new(err))
    }
}

impl From<anyhow::Error> for PipeworkError {
    fn from(err: anyhow::Error) -> Self {
        // Keep the sentinel recognisable when it travelled through anyhow.
        match err.downcast::<PipeworkError>() {
            Ok(inner) => inner,
            Err(err) => PipeworkError::Other(Arc::new(err)),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipeworkError>;
