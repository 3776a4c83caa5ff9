// src/worker/remote.rs

//! The worker thread's side of the protocol.

use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::errors::Result;
use crate::files::Files;
use crate::logging;
use crate::paths::AbsolutePath;
use crate::plug::WorkerPlug;
use crate::run::Run;
use crate::worker::wire::{WireFiles, WorkerData, WorkerMessage};

/// Exit code of a worker that posted its message.
pub const EXIT_OK: i32 = 0;
/// Exit code of a worker that could not start (bad payload, unusable log
/// file, no runtime, running on the main thread).
pub const EXIT_STARTUP_FAILURE: i32 = 1;

/// Entry point of a worker thread.
///
/// Decodes `payload`, re-applies the caller's log options for this thread,
/// rebuilds `Run` and `Files`, constructs `P` from the forwarded arguments
/// and awaits its `pipe` on a private current-thread runtime. Exactly one
/// message is posted on `reply` unless startup fails. Failures are logged
/// here, closest to where they happened; the caller only learns
/// "failed".
pub fn worker_main<P: WorkerPlug>(payload: String, reply: oneshot::Sender<String>) -> i32 {
    if std::thread::current().name() == Some("main") {
        error!("worker_main called on the main thread");
        return EXIT_STARTUP_FAILURE;
    }

    let data: WorkerData = match serde_json::from_str(&payload) {
        Ok(data) => data,
        Err(e) => {
            error!(error = %e, "malformed worker payload");
            return EXIT_STARTUP_FAILURE;
        }
    };

    let _log_guard = match logging::apply_in_worker(&data.log_options) {
        Ok(guard) => guard,
        Err(e) => {
            error!(error = %e, "failed to apply worker log options");
            return EXIT_STARTUP_FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start worker runtime");
            return EXIT_STARTUP_FAILURE;
        }
    };

    let message = runtime.block_on(run_plug::<P>(data));

    let encoded = match serde_json::to_string(&message) {
        Ok(encoded) => encoded,
        Err(e) => {
            // Nothing is posted; the caller sees an exit without a message.
            error!(error = %e, "failed to encode worker result");
            return EXIT_OK;
        }
    };

    if reply.send(encoded).is_err() {
        debug!("caller stopped waiting for the worker result");
    }
    EXIT_OK
}

async fn run_plug<P: WorkerPlug>(data: WorkerData) -> WorkerMessage {
    let cwd = match AbsolutePath::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            error!(error = %e, "worker could not determine the working directory");
            return WorkerMessage::Failed;
        }
    };

    let (run, files) = match data.reconstruct(cwd) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "worker could not rebuild its input");
            return WorkerMessage::Failed;
        }
    };

    debug!(
        task = %run.task_name(),
        plug = std::any::type_name::<P>(),
        files = files.len(),
        "worker started"
    );

    match pipe_files::<P>(data.args, files, &run).await {
        Ok(message) => message,
        Err(err) => {
            // Logged here, once; the sentinel is not logged again.
            run.log().report_error(err);
            WorkerMessage::Failed
        }
    }
}

async fn pipe_files<P: WorkerPlug>(
    args: serde_json::Value,
    files: Files,
    run: &Run,
) -> Result<WorkerMessage> {
    let args: P::Args = serde_json::from_value(args)?;
    let plug = P::new(args)?;
    let result = plug.pipe(files, run).await?;
    let result = result.as_ref().map(WireFiles::from_files).transpose()?;
    Ok(WorkerMessage::Completed { result })
}
