// src/build/mod.rs

//! Task graph and invocation runtime.
//!
//! - [`BuildDefinition`] collects task bodies (and tasks imported from other
//!   builds) and compiles them into a [`Build`].
//! - [`task`] holds the compiled [`Task`] and its stable [`TaskId`].
//! - [`state`] holds the per-invocation cache and call stack.
//! - [`context`] is the explicit [`Context`] handed to task bodies, with the
//!   run / series / parallel / merge / pipe primitives.
//! - [`pipe`] chains plugs after a source of files.

pub mod context;
pub mod pipe;
pub mod state;
pub mod task;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

pub use context::{merge_files, Context};
pub use pipe::Pipe;
pub use state::{CallStack, State};
pub use task::{Task, TaskId};

use crate::errors::{PipeworkError, Result};
use crate::files::Files;
use crate::logging::LogContext;
use crate::paths::AbsolutePath;
use task::TaskBody;

/// What a task body (or a plug) produces.
pub type TaskResult = Result<Option<Files>>;

/// Shared, read-only record of one compiled build file.
#[derive(Debug)]
pub struct BuildContext {
    build_file: AbsolutePath,
    build_dir: AbsolutePath,
    tasks: BTreeMap<String, Arc<Task>>,
    /// Builds that imported tasks come from; kept alive with this one.
    imports: Vec<Arc<BuildContext>>,
}

impl BuildContext {
    pub fn build_file(&self) -> &AbsolutePath {
        &self.build_file
    }

    pub fn build_dir(&self) -> &AbsolutePath {
        &self.build_dir
    }

    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.get(name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tasks.keys().map(String::as_str)
    }

    pub fn imports(&self) -> &[Arc<BuildContext>] {
        &self.imports
    }
}

enum Entry {
    Body(Arc<TaskBody>),
    Import {
        task: Arc<Task>,
        origin: Arc<BuildContext>,
    },
}

/// A build file's tasks before compilation.
///
/// Later definitions of a name replace earlier ones.
pub struct BuildDefinition {
    build_file: AbsolutePath,
    entries: BTreeMap<String, Entry>,
}

impl BuildDefinition {
    pub fn new(build_file: AbsolutePath) -> Self {
        Self {
            build_file,
            entries: BTreeMap::new(),
        }
    }

    /// Define a task from an async closure.
    pub fn task<F, Fut>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        let body: Arc<TaskBody> =
            Arc::new(move |ctx: Context| -> BoxFuture<'static, TaskResult> { body(ctx).boxed() });
        self.entries.insert(name.into(), Entry::Body(body));
        self
    }

    /// Expose `origin_name` from an already compiled build as `name`.
    ///
    /// The task itself is shared, not copied: it keeps its id (so both builds
    /// hit the same cache entry within one invocation) and keeps resolving
    /// sibling names and `@` paths against its origin build file.
    pub fn import(mut self, name: impl Into<String>, from: &Build, origin_name: &str) -> Result<Self> {
        let task = from
            .context
            .task(origin_name)
            .cloned()
            .ok_or_else(|| PipeworkError::TaskNotFound(origin_name.to_string()))?;
        self.entries.insert(
            name.into(),
            Entry::Import {
                task,
                origin: from.context.clone(),
            },
        );
        Ok(self)
    }

    /// Compile against the current working directory.
    pub fn compile(self, log: &LogContext) -> Result<Build> {
        Ok(self.compile_in(log, AbsolutePath::current_dir()?))
    }

    /// Compile with an explicit working directory for path resolution.
    pub fn compile_in(self, log: &LogContext, cwd: AbsolutePath) -> Build {
        let BuildDefinition { build_file, entries } = self;

        let mut names: Vec<&str> = entries.keys().map(String::as_str).collect();
        for entry in entries.values() {
            if let Entry::Import { task, .. } = entry {
                names.push(task.name());
            }
        }
        let log = log.with_task_names(names);

        let build_dir = build_file
            .parent()
            .unwrap_or_else(|| build_file.clone());

        let context = Arc::new_cyclic(|weak| {
            let mut tasks = BTreeMap::new();
            let mut imports: Vec<Arc<BuildContext>> = Vec::new();

            for (name, entry) in entries {
                let task = match entry {
                    Entry::Body(body) => Arc::new(Task::new(name.clone(), body, weak.clone())),
                    Entry::Import { task, origin } => {
                        if !imports.iter().any(|known| Arc::ptr_eq(known, &origin)) {
                            imports.push(origin);
                        }
                        task
                    }
                };
                tasks.insert(name, task);
            }

            BuildContext {
                build_file,
                build_dir,
                tasks,
                imports,
            }
        });

        debug!(
            build_file = %context.build_file,
            tasks = context.tasks.len(),
            "compiled build"
        );

        Build { context, log, cwd }
    }
}

/// A compiled build: one callable task per name.
#[derive(Debug, Clone)]
pub struct Build {
    context: Arc<BuildContext>,
    log: LogContext,
    cwd: AbsolutePath,
}

impl Build {
    /// Invoke a task as a new top-level call.
    ///
    /// Every call gets a fresh [`State`], so calling the same task twice
    /// executes its body twice.
    pub async fn call(&self, name: &str) -> TaskResult {
        let task = self
            .context
            .task(name)
            .cloned()
            .ok_or_else(|| PipeworkError::TaskNotFound(name.to_string()))?;

        let state = Arc::new(State::new(self.log.clone(), self.cwd.clone()));
        context::invoke(state, CallStack::default(), task).await
    }

    pub fn context(&self) -> &Arc<BuildContext> {
        &self.context
    }

    pub fn build_file(&self) -> &AbsolutePath {
        &self.context.build_file
    }

    pub fn build_dir(&self) -> &AbsolutePath {
        &self.context.build_dir
    }

    pub fn cwd(&self) -> &AbsolutePath {
        &self.cwd
    }

    pub fn log_context(&self) -> &LogContext {
        &self.log
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.context.task_names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.context.tasks.contains_key(name)
    }

    pub fn task(&self, name: &str) -> Option<&Arc<Task>> {
        self.context.task(name)
    }
}
