// src/worker/exchange.rs

//! Pure state machine for the caller's side of one worker call.
//!
//! The async shell in [`execute_worker`](crate::worker::execute_worker)
//! turns thread and channel events into [`WorkerSignal`]s and feeds them in
//! order; this module decides when and how the call settles. It has no
//! channels, no threads and no IO, so it is tested directly.
//!
//! Rules:
//! - the first terminal signal wins; anything after it is ignored;
//! - `MessageError` and `Error` settle immediately with the sentinel;
//! - `Message` is stashed and does not settle;
//! - `Exit` settles: non-zero code → sentinel; otherwise the stashed
//!   result, or the sentinel if the worker reported a failure or never
//!   posted anything.

use tracing::debug;

use crate::build::TaskResult;
use crate::errors::PipeworkError;
use crate::worker::wire::WorkerMessage;

/// Something that happened on the worker's side of the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerSignal {
    /// The worker posted its (encoded) message.
    Message(String),
    /// A message arrived but could not be decoded.
    MessageError(String),
    /// The worker thread died (panicked) or could not be joined.
    Error(String),
    /// The worker thread finished with this exit code.
    Exit(i32),
}

/// What the shell should do after feeding a signal.
#[derive(Debug)]
pub enum ExchangeStep {
    /// Keep waiting for more signals.
    Pending,
    /// The call is settled with `result`. `diagnostic` is a transport
    /// problem the caller must log once before surfacing the sentinel.
    Settled {
        result: TaskResult,
        diagnostic: Option<PipeworkError>,
    },
    /// The call was already settled; the signal changes nothing.
    Ignored,
}

#[derive(Debug, Default)]
pub struct WorkerExchange {
    completed: bool,
    stash: Option<WorkerMessage>,
}

impl WorkerExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn handle(&mut self, signal: WorkerSignal) -> ExchangeStep {
        if self.completed {
            debug!(?signal, "worker signal after settlement ignored");
            return ExchangeStep::Ignored;
        }

        match signal {
            WorkerSignal::Message(raw) => match serde_json::from_str::<WorkerMessage>(&raw) {
                Ok(message) => {
                    if self.stash.is_some() {
                        debug!("worker posted more than one message; keeping the first");
                    } else {
                        self.stash = Some(message);
                    }
                    ExchangeStep::Pending
                }
                Err(e) => self.handle(WorkerSignal::MessageError(e.to_string())),
            },
            WorkerSignal::MessageError(reason) => self.fail(PipeworkError::WorkerTransport(
                format!("undecodable worker message: {reason}"),
            )),
            WorkerSignal::Error(reason) => {
                self.fail(PipeworkError::WorkerTransport(format!("worker error: {reason}")))
            }
            WorkerSignal::Exit(code) if code != 0 => self.fail(PipeworkError::WorkerExit(code)),
            WorkerSignal::Exit(_) => self.exit_cleanly(),
        }
    }

    fn fail(&mut self, diagnostic: PipeworkError) -> ExchangeStep {
        self.completed = true;
        ExchangeStep::Settled {
            result: Err(PipeworkError::Reported),
            diagnostic: Some(diagnostic),
        }
    }

    fn exit_cleanly(&mut self) -> ExchangeStep {
        match self.stash.take() {
            Some(WorkerMessage::Completed { result }) => {
                match result.map(|wire| wire.into_files()).transpose() {
                    Ok(files) => {
                        self.completed = true;
                        ExchangeStep::Settled {
                            result: Ok(files),
                            diagnostic: None,
                        }
                    }
                    Err(e) => self.fail(PipeworkError::WorkerTransport(format!(
                        "worker returned invalid files: {e}"
                    ))),
                }
            }
            Some(WorkerMessage::Failed) => {
                self.completed = true;
                ExchangeStep::Settled {
                    result: Err(PipeworkError::Reported),
                    diagnostic: None,
                }
            }
            None => self.fail(PipeworkError::WorkerTransport(
                "worker exited without posting a result".to_string(),
            )),
        }
    }
}
