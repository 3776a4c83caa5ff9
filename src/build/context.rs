// src/build/context.rs

//! The explicit context handed to every task body, and the memoizing
//! invocation procedure behind it.

use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use futures::future::join_all;
use tracing::trace;

use crate::build::pipe::Pipe;
use crate::build::state::{CallStack, State};
use crate::build::{BuildContext, Task, TaskResult};
use crate::errors::{PipeworkError, Result};
use crate::files::{find, FindOptions, Files, FilesBuilder};
use crate::fs::RealFileSystem;
use crate::logging::Logger;
use crate::paths::AbsolutePath;
use crate::run::Run;

/// What a running task body sees.
///
/// Sibling tasks are looked up by name in the build that defined the
/// *running* task, so an imported task keeps resolving names against its own
/// build file.
#[derive(Debug, Clone)]
pub struct Context {
    task: Arc<Task>,
    build: Arc<BuildContext>,
    state: Arc<State>,
    stack: CallStack,
    run: Run,
}

impl Context {
    pub fn task_name(&self) -> &str {
        self.task.name()
    }

    pub fn current_run(&self) -> &Run {
        &self.run
    }

    pub fn log(&self) -> &Logger {
        self.run.log()
    }

    pub fn resolve(&self, path: impl AsRef<str>) -> AbsolutePath {
        self.run.resolve(path)
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    /// Invoke a sibling task and return its result.
    pub async fn run(&self, name: &str) -> TaskResult {
        let task = self.lookup(name)?;
        invoke(self.state.clone(), self.stack.clone(), task).await
    }

    /// Invoke tasks one after another; results in argument order.
    pub async fn series(&self, names: &[&str]) -> Result<Vec<Option<Files>>> {
        let tasks = self.lookup_all(names)?;
        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(invoke(self.state.clone(), self.stack.clone(), task).await?);
        }
        Ok(results)
    }

    /// Invoke tasks concurrently; results in argument order. The first
    /// failure (in argument order) is returned once every branch settled.
    pub async fn parallel(&self, names: &[&str]) -> Result<Vec<Option<Files>>> {
        let tasks = self.lookup_all(names)?;
        let pending = tasks
            .into_iter()
            .map(|task| invoke(self.state.clone(), self.stack.clone(), task));
        join_all(pending).await.into_iter().collect()
    }

    /// Invoke tasks concurrently and concatenate the files they produce.
    pub async fn merge(&self, names: &[&str]) -> Result<Files> {
        let results = self.parallel(names).await?;
        merge_files(results, self.run.cwd())
    }

    /// A pipe seeded with the result of the named task.
    pub fn pipe(&self, name: &str) -> Pipe {
        let ctx = self.clone();
        let name = name.to_string();
        Pipe::new(async move { ctx.run(&name).await }, self.run.clone())
    }

    /// A pipe seeded with the given files.
    pub fn files(&self, files: Files) -> Pipe {
        Pipe::new(async move { Ok(Some(files)) }, self.run.clone())
    }

    /// A pipe seeded with the files under `directory` (resolved like
    /// [`Run::resolve`]) matching `globs`.
    pub fn find(&self, directory: &str, globs: &[&str], options: FindOptions) -> Pipe {
        let directory = self.resolve(directory);
        let globs: Vec<String> = globs.iter().map(|g| g.to_string()).collect();
        Pipe::new(
            async move { find(&RealFileSystem, &directory, &globs, &options).map(Some) },
            self.run.clone(),
        )
    }

    fn lookup(&self, name: &str) -> Result<Arc<Task>> {
        self.build
            .task(name)
            .cloned()
            .ok_or_else(|| PipeworkError::TaskNotFound(name.to_string()))
    }

    fn lookup_all(&self, names: &[&str]) -> Result<Vec<Arc<Task>>> {
        names.iter().map(|name| self.lookup(name)).collect()
    }
}

/// Concatenate present results into one [`Files`] rooted at the deepest
/// directory containing all of them. With no files at all, an empty set
/// rooted at `fallback`.
pub fn merge_files(results: Vec<Option<Files>>, fallback: &AbsolutePath) -> Result<Files> {
    let present: Vec<Files> = results.into_iter().flatten().collect();

    let directory = match present.split_first() {
        None => return Ok(Files::empty(fallback.clone())),
        Some((first, rest)) => rest.iter().fold(first.directory().clone(), |dir, f| {
            dir.common_ancestor(f.directory())
        }),
    };

    let mut builder = FilesBuilder::new(directory);
    for files in &present {
        builder.merge(files)?;
    }
    builder.build()
}

/// Invoke `task` on behalf of a caller whose call chain is `stack`.
///
/// 1. A task already on the caller's chain fails with
///    [`PipeworkError::CircularInvocation`]; this must come before the cache
///    lookup, or the task would wait on its own pending future.
/// 2. A task already invoked in this state returns the cached shared future.
/// 3. Otherwise the body is wrapped in a shared future, cached, then awaited.
pub(crate) async fn invoke(state: Arc<State>, stack: CallStack, task: Arc<Task>) -> TaskResult {
    if stack.contains(task.id()) {
        return Err(PipeworkError::CircularInvocation {
            chain: stack.chain_to(&task),
        });
    }

    let (shared, fresh) = state.get_or_insert_with(task.id(), || {
        execute(state.clone(), stack.push(&task), task.clone())
            .boxed()
            .shared()
    });

    if !fresh {
        trace!(task = %task.name(), id = %task.id(), "awaiting memoized invocation");
    }
    shared.await
}

async fn execute(state: Arc<State>, stack: CallStack, task: Arc<Task>) -> TaskResult {
    let build = task.context().ok_or_else(|| {
        PipeworkError::TaskNotFound(format!("{} (its build was dropped)", task.name()))
    })?;

    let run = Run::new(
        task.name(),
        build.build_file().clone(),
        build.build_dir().clone(),
        state.cwd().clone(),
        state.log().clone(),
    );
    let log = run.log().clone();

    let ctx = Context {
        task: task.clone(),
        build,
        state,
        stack,
        run,
    };

    log.debug("starting");
    let started = Instant::now();
    let result = task.call(ctx).await;
    let elapsed = started.elapsed();

    match &result {
        Ok(_) => log.info(format_args!("completed in {elapsed:.2?}")),
        Err(err) if err.is_reported() => log.debug(format_args!("failed in {elapsed:.2?}")),
        Err(err) => log.debug(format_args!("failed in {elapsed:.2?}: {err}")),
    }
    result
}
