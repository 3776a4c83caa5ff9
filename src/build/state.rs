// src/build/state.rs

//! Per-invocation memoization and reentrancy tracking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, Shared};

use crate::build::{Task, TaskId, TaskResult};
use crate::logging::LogContext;
use crate::paths::AbsolutePath;

pub(crate) type SharedTask = Shared<BoxFuture<'static, TaskResult>>;

/// State of one top-level invocation.
///
/// The cache maps a task to the shared future of its single execution, so
/// every caller in this invocation awaits the same result (or the same
/// failure). A new top-level call gets a new `State`: nothing is memoized
/// across calls.
pub struct State {
    cache: Mutex<HashMap<TaskId, SharedTask>>,
    log: LogContext,
    cwd: AbsolutePath,
}

impl State {
    pub fn new(log: LogContext, cwd: AbsolutePath) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            log,
            cwd,
        }
    }

    pub fn log(&self) -> &LogContext {
        &self.log
    }

    pub fn cwd(&self) -> &AbsolutePath {
        &self.cwd
    }

    /// Whether `task` has been invoked in this state.
    pub fn contains(&self, task: TaskId) -> bool {
        self.lock().contains_key(&task)
    }

    /// Number of distinct tasks invoked so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The cached future for `task`, creating it with `make` on first use.
    ///
    /// The second element is true when the future was created by this call.
    /// The lock is released before anything is polled.
    pub(crate) fn get_or_insert_with(
        &self,
        task: TaskId,
        make: impl FnOnce() -> SharedTask,
    ) -> (SharedTask, bool) {
        let mut cache = self.lock();
        if let Some(existing) = cache.get(&task) {
            return (existing.clone(), false);
        }
        let fresh = make();
        cache.insert(task, fresh.clone());
        (fresh, true)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, SharedTask>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("cached", &self.len())
            .field("cwd", &self.cwd)
            .finish_non_exhaustive()
    }
}

/// The chain of tasks leading to the current invocation.
///
/// Each invocation extends its caller's stack; the extension lives exactly as
/// long as that invocation's context, so parallel branches never see each
/// other's frames.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Arc<Vec<Frame>>,
}

#[derive(Debug, Clone)]
struct Frame {
    id: TaskId,
    name: String,
}

impl CallStack {
    pub fn contains(&self, task: TaskId) -> bool {
        self.frames.iter().any(|f| f.id == task)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// A new stack with `task` on top.
    pub(crate) fn push(&self, task: &Task) -> CallStack {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.extend(self.frames.iter().cloned());
        frames.push(Frame {
            id: task.id(),
            name: task.name().to_string(),
        });
        CallStack {
            frames: Arc::new(frames),
        }
    }

    /// Task names from the outermost call to `task`, for diagnostics.
    pub(crate) fn chain_to(&self, task: &Task) -> Vec<String> {
        self.frames
            .iter()
            .map(|f| f.name.clone())
            .chain(std::iter::once(task.name().to_string()))
            .collect()
    }

    /// Task names on the stack, outermost first.
    pub fn names(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.name.as_str()).collect()
    }
}
