// src/config/compile.rs

//! Turning a validated [`BuildFile`] into a [`BuildDefinition`].
//!
//! Every `[task.<name>]` becomes one task body:
//!
//! 1. invoke `after` (in order, or concurrently with `parallel = true`);
//! 2. select its files: `find` under `directory`, or else the merged
//!    results of `after` (nothing when they produced nothing);
//! 3. pipe those files (an empty set rooted at the build directory when
//!    there are none) into `cmd`, in-process or on a worker thread;
//! 4. return the files from step 2.

use std::sync::Arc;

use crate::build::{merge_files, BuildDefinition, Context, TaskResult};
use crate::config::model::{BuildFile, TaskConfig};
use crate::files::{Files, FindOptions};
use crate::paths::AbsolutePath;
use crate::plug::{Exec, ExecArgs};

/// Compile `file` into a definition rooted at `build_file`.
pub fn compile_build_file(file: BuildFile, build_file: AbsolutePath) -> BuildDefinition {
    file.into_tasks()
        .into_iter()
        .fold(BuildDefinition::new(build_file), |definition, (name, task)| {
            let task = Arc::new(task);
            definition.task(name, move |ctx| run_task(ctx, task.clone()))
        })
}

async fn run_task(ctx: Context, task: Arc<TaskConfig>) -> TaskResult {
    let after: Vec<&str> = task.after.iter().map(String::as_str).collect();
    let deps = if after.is_empty() {
        Vec::new()
    } else if task.parallel {
        ctx.parallel(&after).await?
    } else {
        ctx.series(&after).await?
    };

    let sources = if !task.find.is_empty() {
        let globs: Vec<&str> = task.find.iter().map(String::as_str).collect();
        let options = FindOptions {
            ignore: task.ignore.clone(),
        };
        ctx.find(&task.directory, &globs, options).await?
    } else if deps.iter().any(Option::is_some) {
        Some(merge_files(deps, ctx.current_run().cwd())?)
    } else {
        None
    };

    if let Some(cmd) = &task.cmd {
        let input = sources
            .clone()
            .unwrap_or_else(|| Files::empty(ctx.current_run().build_dir().clone()));
        let args = ExecArgs {
            cmd: cmd.clone(),
            pass_files: task.pass_files,
            cwd: Some("@".to_string()),
        };

        let pipe = ctx.files(input);
        if task.worker {
            pipe.plug_in_worker::<Exec>(args).await?;
        } else {
            pipe.plug(Exec::from_args(args)).await?;
        }
    }

    Ok(sources)
}
