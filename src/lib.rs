// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod errors;
pub mod files;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod plug;
pub mod run;
pub mod types;
pub mod worker;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use tracing::{debug, error, info};

use crate::build::Build;
use crate::cli::CliArgs;
use crate::config::{compile_build_file, load_and_validate, BuildFile};
use crate::errors::{PipeworkError, Result};
use crate::logging::{LogContext, LogOptions};
use crate::paths::AbsolutePath;

pub use crate::build::{BuildDefinition, Context, TaskResult};
pub use crate::files::{Files, FilesBuilder};
pub use crate::run::Run;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - build file loading and validation
/// - compilation into a [`Build`]
/// - invoking the requested tasks, optionally under a timeout
///
/// A failure that was already logged where it happened only turns into a
/// failing exit code; anything else is logged once here first.
pub async fn run(args: CliArgs, options: LogOptions) -> anyhow::Result<ExitCode> {
    let build_file = AbsolutePath::current_dir()?.join(&args.file);
    let file = load_and_validate(&build_file)
        .with_context(|| format!("loading build file {build_file}"))?;

    if args.dry_run {
        print_dry_run(&build_file, &file);
        return Ok(ExitCode::SUCCESS);
    }

    let log = LogContext::new(options);
    let build = compile_build_file(file, build_file).compile(&log)?;

    match run_tasks(&build, &args.task_names(), args.timeout()).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) if err.is_reported() => Ok(ExitCode::FAILURE),
        Err(err) => {
            error!("{err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Invoke `names` one after another, each as a fresh top-level call.
///
/// With a `timeout`, the whole sequence is abandoned once it expires; the
/// expiry is logged and surfaces as the already-reported sentinel. Worker
/// threads still running at that point are left to process exit.
pub async fn run_tasks(build: &Build, names: &[String], timeout: Option<Duration>) -> Result<()> {
    let all = async {
        for name in names {
            info!(task = %name, "invoking");
            build.call(name).await?;
        }
        Ok::<(), PipeworkError>(())
    };

    match timeout {
        None => all.await,
        Some(limit) => match tokio::time::timeout(limit, all).await {
            Ok(result) => result,
            Err(_) => {
                error!("build timed out after {limit:?}");
                Err(PipeworkError::Reported)
            }
        },
    }
}

/// Simple dry-run output: print tasks, deps and commands.
fn print_dry_run(path: &AbsolutePath, file: &BuildFile) {
    println!("pipework dry-run");
    println!("  build file = {path}");
    println!();

    println!("tasks ({}):", file.tasks().len());
    for (name, task) in file.tasks() {
        println!("  - {name}");
        if !task.after.is_empty() {
            let mode = if task.parallel { "parallel" } else { "series" };
            println!("      after ({mode}): {:?}", task.after);
        }
        if !task.find.is_empty() {
            println!("      find: {:?} in {}", task.find, task.directory);
        }
        if !task.ignore.is_empty() {
            println!("      ignore: {:?}", task.ignore);
        }
        if let Some(ref cmd) = task.cmd {
            println!("      cmd: {cmd}");
        }
        if task.pass_files {
            println!("      pass_files: true");
        }
        if task.worker {
            println!("      worker: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
