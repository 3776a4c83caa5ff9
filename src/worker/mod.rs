// src/worker/mod.rs

//! Worker-thread offload.
//!
//! [`execute_worker`] runs one plug on its own OS thread, with its own
//! single-threaded tokio runtime, and makes it look like an ordinary async
//! call: same log output, same "already reported" failure, typed result.
//!
//! - [`wire`] holds the plain-data messages crossing the boundary.
//! - [`exchange`] is the pure state machine deciding how a call settles.
//! - [`remote`] is the code running on the worker thread.
//!
//! Each call owns exactly one thread; there is no pooling. Calls share no
//! state, so any number may be in flight at once.

pub mod exchange;
pub mod remote;
pub mod wire;

use std::any::Any;

use tokio::sync::oneshot;
use tracing::debug;

pub use exchange::{ExchangeStep, WorkerExchange, WorkerSignal};
pub use remote::worker_main;
pub use wire::{WireFiles, WorkerData, WorkerMessage};

use crate::build::TaskResult;
use crate::errors::PipeworkError;
use crate::files::Files;
use crate::plug::WorkerPlug;
use crate::run::Run;

/// Prefix of every worker thread's name.
pub const WORKER_THREAD_PREFIX: &str = "pipework-worker:";

/// Run `P::new(args).pipe(files, run)` on a fresh worker thread.
///
/// Failures inside the plug are logged by the worker and surface here as
/// [`PipeworkError::Reported`]. Transport failures (undecodable message,
/// panicked thread, non-zero exit) are logged once here and surface the
/// same way.
pub async fn execute_worker<P: WorkerPlug>(args: &P::Args, files: Files, run: &Run) -> TaskResult {
    let log = run.log();

    let data = WorkerData::snapshot(serde_json::to_value(args)?, &files, run)?;
    let payload = serde_json::to_string(&data)?;
    drop(files);

    let (reply_tx, reply_rx) = oneshot::channel::<String>();
    let handle = std::thread::Builder::new()
        .name(format!("{WORKER_THREAD_PREFIX}{}", run.task_name()))
        .spawn(move || worker_main::<P>(payload, reply_tx))
        .map_err(|e| log.fail(format_args!("failed to spawn worker thread: {e}")))?;

    debug!(task = %run.task_name(), plug = std::any::type_name::<P>(), "worker spawned");

    let mut exchange = WorkerExchange::new();

    // The worker drops its sender without posting when it fails to start;
    // the exit code below tells the rest.
    if let Ok(raw) = reply_rx.await {
        if let Some(result) = settle(exchange.handle(WorkerSignal::Message(raw)), run) {
            return result;
        }
    }

    let exit = match tokio::task::spawn_blocking(move || handle.join()).await {
        Ok(Ok(code)) => WorkerSignal::Exit(code),
        Ok(Err(panic)) => WorkerSignal::Error(panic_message(panic.as_ref())),
        Err(join_err) => WorkerSignal::Error(join_err.to_string()),
    };

    match settle(exchange.handle(exit), run) {
        Some(result) => result,
        // Exit always settles a pending exchange; reaching this means the
        // state machine was already completed.
        None => Err(PipeworkError::Reported),
    }
}

fn settle(step: ExchangeStep, run: &Run) -> Option<TaskResult> {
    match step {
        ExchangeStep::Pending | ExchangeStep::Ignored => None,
        ExchangeStep::Settled { result, diagnostic } => {
            if let Some(diagnostic) = diagnostic {
                run.log().error(diagnostic);
            }
            Some(result)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
