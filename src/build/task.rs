// src/build/task.rs

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::BoxFuture;

use crate::build::{BuildContext, Context, TaskResult};

/// Stable identity of a compiled task.
///
/// Assigned once at compile time from a process-wide counter. Two tasks with
/// identical bodies still get different ids; an imported task keeps the id
/// of its origin, so both builds share its cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl TaskId {
    fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type TaskBody = dyn Fn(Context) -> BoxFuture<'static, TaskResult> + Send + Sync;

/// A task body bound to the build that defined it.
pub struct Task {
    id: TaskId,
    name: String,
    body: Arc<TaskBody>,
    context: Weak<BuildContext>,
}

impl Task {
    pub(crate) fn new(name: String, body: Arc<TaskBody>, context: Weak<BuildContext>) -> Self {
        Self {
            id: TaskId::next(),
            name,
            body,
            context,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The build that defined this task, if it is still alive.
    pub fn context(&self) -> Option<Arc<BuildContext>> {
        self.context.upgrade()
    }

    /// Run the body with `ctx`. Callers go through the memoizing invocation
    /// procedure instead of calling this directly.
    pub(crate) fn call(&self, ctx: Context) -> BoxFuture<'static, TaskResult> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
