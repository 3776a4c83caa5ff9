// src/build/pipe.rs

use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

use crate::build::TaskResult;
use crate::errors::PipeworkError;
use crate::plug::{InWorker, Plug, WorkerPlug};
use crate::run::Run;

/// A source of files followed by a chain of plugs.
///
/// Nothing runs until the pipe is awaited. Each stage receives the previous
/// stage's files; a stage that produces nothing ends the data flow, and
/// handing "nothing" to a further stage fails with
/// [`PipeworkError::NoFiles`].
pub struct Pipe {
    source: BoxFuture<'static, TaskResult>,
    run: Run,
    stages: Vec<Arc<dyn Plug>>,
}

impl Pipe {
    pub fn new<F>(source: F, run: Run) -> Self
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        Self {
            source: source.boxed(),
            run,
            stages: Vec::new(),
        }
    }

    /// Append an in-process stage.
    pub fn plug(mut self, plug: impl Plug + 'static) -> Self {
        self.stages.push(Arc::new(plug));
        self
    }

    /// Append a stage executed on its own worker thread.
    pub fn plug_in_worker<P: WorkerPlug>(self, args: P::Args) -> Self {
        self.plug(InWorker::<P>::new(args))
    }

    pub fn stages(&self) -> usize {
        self.stages.len()
    }

    pub async fn run(self) -> TaskResult {
        let Pipe { source, run, stages } = self;

        let mut current = source.await?;
        for stage in stages {
            let files = current.ok_or_else(|| PipeworkError::NoFiles {
                stage: stage.name().to_string(),
            })?;
            debug!(
                task = %run.task_name(),
                stage = %stage.name(),
                files = files.len(),
                "piping files"
            );
            current = stage.pipe(files, &run).await?;
        }
        Ok(current)
    }
}

impl IntoFuture for Pipe {
    type Output = TaskResult;
    type IntoFuture = BoxFuture<'static, TaskResult>;

    fn into_future(self) -> Self::IntoFuture {
        self.run().boxed()
    }
}

impl fmt::Debug for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("Pipe")
            .field("task", &self.run.task_name())
            .field("stages", &names)
            .finish_non_exhaustive()
    }
}
