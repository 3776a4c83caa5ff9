// src/plug/mod.rs

//! Pipeline stages.
//!
//! A [`Plug`] transforms a [`Files`] into a new result. Concrete plugs
//! (linters, compilers, test runners) live outside the core; [`exec`]
//! provides the one built in, for running shell commands.
//!
//! A [`WorkerPlug`] can additionally be constructed from plain serde
//! arguments, which is what lets [`InWorker`] rebuild it on a worker thread.

pub mod exec;

use std::marker::PhantomData;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use exec::{Exec, ExecArgs};

use crate::build::TaskResult;
use crate::errors::Result;
use crate::files::Files;
use crate::run::Run;
use crate::worker::execute_worker;

/// Trait implemented by pipeline stages.
///
/// Any implementation is substitutable in-process; implementations that
/// also implement [`WorkerPlug`] can run on a worker thread.
pub trait Plug: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn pipe<'a>(&'a self, files: Files, run: &'a Run) -> BoxFuture<'a, TaskResult>;
}

/// A plug that can be rebuilt from plain data on the other side of a thread
/// boundary.
pub trait WorkerPlug: Plug + Sized + 'static {
    /// Constructor arguments; shipped to the worker as JSON.
    type Args: Serialize + DeserializeOwned + Send + Sync + 'static;

    fn new(args: Self::Args) -> Result<Self>;
}

/// Runs `P` on a dedicated worker thread each time it is piped.
pub struct InWorker<P: WorkerPlug> {
    args: P::Args,
    name: String,
    _plug: PhantomData<fn() -> P>,
}

impl<P: WorkerPlug> InWorker<P> {
    pub fn new(args: P::Args) -> Self {
        Self {
            args,
            name: format!("{} (worker)", std::any::type_name::<P>()),
            _plug: PhantomData,
        }
    }
}

impl<P: WorkerPlug> Plug for InWorker<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn pipe<'a>(&'a self, files: Files, run: &'a Run) -> BoxFuture<'a, TaskResult> {
        Box::pin(execute_worker::<P>(&self.args, files, run))
    }
}
