//! Plugs for exercising pipes and the worker protocol.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use pipework::build::TaskResult;
use pipework::errors::{PipeworkError, Result};
use pipework::files::{Files, FilesBuilder};
use pipework::plug::{Plug, WorkerPlug};
use pipework::run::Run;

/// Records the relative paths of every `Files` it sees and passes them on.
#[derive(Debug, Clone, Default)]
pub struct RecordingPlug {
    seen: Arc<Mutex<Vec<Vec<PathBuf>>>>,
}

impl RecordingPlug {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<Vec<PathBuf>> {
        self.seen.lock().expect("recording lock").clone()
    }
}

impl Plug for RecordingPlug {
    fn name(&self) -> &str {
        "recording"
    }

    fn pipe<'a>(&'a self, files: Files, _run: &'a Run) -> BoxFuture<'a, TaskResult> {
        Box::pin(async move {
            self.seen.lock().expect("recording lock").push(files.to_vec());
            Ok(Some(files))
        })
    }
}

/// Produces nothing, ending the data flow.
#[derive(Debug, Clone, Default)]
pub struct SinkPlug;

impl Plug for SinkPlug {
    fn name(&self) -> &str {
        "sink"
    }

    fn pipe<'a>(&'a self, _files: Files, _run: &'a Run) -> BoxFuture<'a, TaskResult> {
        Box::pin(async { Ok(None) })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFileArgs {
    /// Output directory, resolved through `Run::resolve`.
    pub out_dir: String,
    pub name: String,
    pub content: String,
}

/// Writes one file listing its inputs (after `content`) and returns it.
#[derive(Debug)]
pub struct WriteFilePlug {
    args: WriteFileArgs,
}

impl Plug for WriteFilePlug {
    fn name(&self) -> &str {
        "write-file"
    }

    fn pipe<'a>(&'a self, files: Files, run: &'a Run) -> BoxFuture<'a, TaskResult> {
        Box::pin(async move {
            let mut body = self.args.content.clone();
            for path in files.iter() {
                body.push('\n');
                body.push_str(&path.to_string_lossy());
            }

            let mut builder = FilesBuilder::new(run.resolve(&self.args.out_dir));
            builder.write(&self.args.name, body)?;
            run.log().info(format_args!("wrote {}", self.args.name));
            Ok(Some(builder.build()?))
        })
    }
}

impl WorkerPlug for WriteFilePlug {
    type Args = WriteFileArgs;

    fn new(args: WriteFileArgs) -> Result<Self> {
        Ok(Self { args })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailArgs {
    pub message: String,
    /// Fail through the logger (already reported) rather than with a plain
    /// error.
    #[serde(default)]
    pub reported: bool,
}

/// Always fails.
#[derive(Debug)]
pub struct FailingPlug {
    args: FailArgs,
}

impl FailingPlug {
    pub fn reported(message: &str) -> Self {
        Self {
            args: FailArgs {
                message: message.to_string(),
                reported: true,
            },
        }
    }

    pub fn unreported(message: &str) -> Self {
        Self {
            args: FailArgs {
                message: message.to_string(),
                reported: false,
            },
        }
    }
}

impl Plug for FailingPlug {
    fn name(&self) -> &str {
        "failing"
    }

    fn pipe<'a>(&'a self, _files: Files, run: &'a Run) -> BoxFuture<'a, TaskResult> {
        Box::pin(async move {
            if self.args.reported {
                Err(run.log().fail(&self.args.message))
            } else {
                Err(PipeworkError::Other(Arc::new(anyhow::anyhow!(
                    "{}",
                    self.args.message
                ))))
            }
        })
    }
}

impl WorkerPlug for FailingPlug {
    type Args = FailArgs;

    fn new(args: FailArgs) -> Result<Self> {
        Ok(Self { args })
    }
}

/// Fails in its constructor, before any file is seen.
#[derive(Debug)]
pub struct RejectingPlug;

impl Plug for RejectingPlug {
    fn pipe<'a>(&'a self, files: Files, _run: &'a Run) -> BoxFuture<'a, TaskResult> {
        Box::pin(async move { Ok(Some(files)) })
    }
}

impl WorkerPlug for RejectingPlug {
    type Args = String;

    fn new(reason: String) -> Result<Self> {
        Err(PipeworkError::ConfigError(reason))
    }
}

/// Panics on the worker thread.
#[derive(Debug)]
pub struct PanickingPlug;

impl Plug for PanickingPlug {
    fn name(&self) -> &str {
        "panicking"
    }

    fn pipe<'a>(&'a self, _files: Files, _run: &'a Run) -> BoxFuture<'a, TaskResult> {
        Box::pin(async { explode() })
    }
}

fn explode() -> TaskResult {
    panic!("plug exploded")
}

impl WorkerPlug for PanickingPlug {
    type Args = ();

    fn new(_args: ()) -> Result<Self> {
        Ok(Self)
    }
}
