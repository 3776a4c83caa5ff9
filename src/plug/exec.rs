// src/plug/exec.rs

//! Shell command plug.

use std::process::Stdio;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::build::TaskResult;
use crate::errors::{PipeworkError, Result};
use crate::files::Files;
use crate::plug::{Plug, WorkerPlug};
use crate::run::Run;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecArgs {
    /// Command line, run through the platform shell.
    pub cmd: String,

    /// Append the absolute path of every input file as an argument.
    #[serde(default)]
    pub pass_files: bool,

    /// Working directory, resolved like `Run::resolve`. Defaults to the
    /// directory of the input files.
    #[serde(default)]
    pub cwd: Option<String>,
}

impl ExecArgs {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            pass_files: false,
            cwd: None,
        }
    }
}

/// Runs a shell command once per pipe, streaming its stdout to the task's
/// log at info and stderr at warn. A non-zero exit fails the stage (already
/// reported). Produces no files.
#[derive(Debug, Clone)]
pub struct Exec {
    args: ExecArgs,
}

impl Exec {
    pub fn command(cmd: impl Into<String>) -> Self {
        Self {
            args: ExecArgs::new(cmd),
        }
    }

    pub fn from_args(args: ExecArgs) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &ExecArgs {
        &self.args
    }

    async fn execute(&self, files: Files, run: &Run) -> TaskResult {
        let log = run.log();
        let cwd = match &self.args.cwd {
            Some(dir) => run.resolve(dir),
            None => files.directory().clone(),
        };

        let mut cmd = shell_command(&self.args.cmd, self.args.pass_files);
        if self.args.pass_files {
            cmd.args(files.absolute_paths().map(|p| p.into_path_buf()));
        }
        cmd.current_dir(&cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log.debug(format_args!("running `{}` in {cwd}", self.args.cmd));
        let mut child = cmd
            .spawn()
            .map_err(|e| log.fail(format_args!("spawning `{}`: {e}", self.args.cmd)))?;

        let stdout = child.stdout.take().map(|out| {
            let log = log.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(out).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log.info(line);
                }
            })
        });
        let stderr = child.stderr.take().map(|err| {
            let log = log.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(err).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log.warn(line);
                }
            })
        });

        let status = child.wait().await?;

        // Drain both streams so nothing is lost after the exit.
        for reader in [stdout, stderr].into_iter().flatten() {
            if let Err(e) = reader.await {
                log.debug(format_args!(
                    "output reader for `{}` ended abnormally: {e}",
                    self.args.cmd
                ));
            }
        }

        let code = status.code().unwrap_or(-1);
        if !status.success() {
            return Err(log.fail(format_args!(
                "`{}` exited with code {code}",
                self.args.cmd
            )));
        }

        log.debug(format_args!("`{}` completed", self.args.cmd));
        Ok(None)
    }
}

/// Build a shell command appropriate for the platform. With `with_files`,
/// arguments added later are appended to the script's command line.
fn shell_command(script: &str, with_files: bool) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(script);
        c
    } else if with_files {
        let mut c = Command::new("sh");
        c.arg("-c").arg(format!("{script} \"$@\"")).arg("sh");
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(script);
        c
    }
}

impl Plug for Exec {
    fn name(&self) -> &str {
        "exec"
    }

    fn pipe<'a>(&'a self, files: Files, run: &'a Run) -> BoxFuture<'a, TaskResult> {
        Box::pin(self.execute(files, run))
    }
}

impl WorkerPlug for Exec {
    type Args = ExecArgs;

    fn new(args: ExecArgs) -> Result<Self> {
        if args.cmd.trim().is_empty() {
            return Err(PipeworkError::ConfigError(
                "exec plug needs a non-empty command".to_string(),
            ));
        }
        Ok(Self { args })
    }
}
