// src/worker/wire.rs

//! Plain-data messages exchanged with a worker thread.
//!
//! Nothing live (no `Run`, no `Files`, no closures) crosses the boundary:
//! the caller snapshots what the worker needs into [`WorkerData`], the
//! worker answers with one [`WorkerMessage`]. Both travel as JSON strings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PipeworkError, Result};
use crate::files::{Files, FilesBuilder};
use crate::logging::{LogContext, LogOptions};
use crate::paths::AbsolutePath;
use crate::run::Run;

/// Outbound snapshot: everything the worker needs to rebuild its side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerData {
    pub log_options: LogOptions,
    #[serde(default)]
    pub task_name: Option<String>,
    pub build_file: PathBuf,
    pub build_dir: PathBuf,
    pub files_dir: PathBuf,
    /// Absolute paths of the input files.
    pub files: Vec<String>,
    /// The plug's constructor arguments.
    pub args: serde_json::Value,
}

impl WorkerData {
    pub fn snapshot(args: serde_json::Value, files: &Files, run: &Run) -> Result<Self> {
        let files_list = files
            .absolute_paths()
            .map(|p| path_string(&p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            log_options: run.log_context().options().clone(),
            task_name: Some(run.task_name().to_string()),
            build_file: run.build_file().to_path_buf(),
            build_dir: run.build_dir().to_path_buf(),
            files_dir: files.directory().to_path_buf(),
            files: files_list,
            args,
        })
    }

    /// Rebuild the worker-local `Run` and `Files`. Files go back through
    /// [`FilesBuilder`], so containment is checked again.
    pub fn reconstruct(&self, cwd: AbsolutePath) -> Result<(Run, Files)> {
        let run = Run::new(
            self.task_name.clone().unwrap_or_else(|| "worker".to_string()),
            AbsolutePath::new(&self.build_file)?,
            AbsolutePath::new(&self.build_dir)?,
            cwd,
            LogContext::new(self.log_options.clone()),
        );

        let mut builder = FilesBuilder::new(AbsolutePath::new(&self.files_dir)?);
        builder.add_all(&self.files)?;
        Ok((run, builder.build()?))
    }
}

/// A `Files` flattened to its directory and relative entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFiles {
    pub directory: PathBuf,
    pub files: Vec<String>,
}

impl WireFiles {
    pub fn from_files(files: &Files) -> Result<Self> {
        Ok(Self {
            directory: files.directory().to_path_buf(),
            files: files.iter().map(path_string).collect::<Result<Vec<_>>>()?,
        })
    }

    pub fn into_files(self) -> Result<Files> {
        let mut builder = FilesBuilder::new(AbsolutePath::new(&self.directory)?);
        builder.add_all(&self.files)?;
        builder.build()
    }
}

/// Inbound: the single message a worker posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerMessage {
    Completed { result: Option<WireFiles> },
    /// The plug failed; the worker already logged why.
    Failed,
}

fn path_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| PipeworkError::InvalidPath(format!("{} is not valid UTF-8", path.display())))
}
