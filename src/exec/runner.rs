// src/exec/runner.rs

//! Watchdog-supervised execution of a single command.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::signal::send_abort;
use super::{merge_env, AbortSignal, CommandDescriptor, ExecutionResult, Outcome, StartError};

/// Timeout used when the caller has no better idea.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long an aborted process gets to die before it is force-killed.
pub const DEFAULT_ABORT_GRACE: Duration = Duration::from_secs(5);

/// Runs one command under a deadline.
///
/// A `Runner` is consumed by [`Runner::run`]; build a new one per invocation.
#[derive(Debug)]
pub struct Runner {
    descriptor: CommandDescriptor,
    abort_grace: Duration,
}

impl Runner {
    pub fn new(descriptor: CommandDescriptor) -> Self {
        Self {
            descriptor,
            abort_grace: DEFAULT_ABORT_GRACE,
        }
    }

    pub fn with_abort_grace(mut self, grace: Duration) -> Self {
        self.abort_grace = grace;
        self
    }

    /// Run the command to completion or until `timeout` elapses.
    ///
    /// - Start failures return immediately with [`Outcome::StartFailed`];
    ///   no watchdog is spawned.
    /// - Otherwise a watchdog task races the process. Whichever of "process
    ///   exited" / "deadline reached" the select observes first decides the
    ///   outcome, and the other side is stood down through a
    ///   `CancellationToken`.
    /// - stdout and stderr are drained concurrently with the wait. After a
    ///   normal exit they are returned in full; after a timeout the drain gets
    ///   `abort_grace` to finish, then whatever was read is returned.
    pub async fn run(self, timeout: Duration) -> ExecutionResult {
        let started = Instant::now();

        info!(
            cmd = %self.descriptor,
            cwd = ?self.descriptor.working_dir,
            ?timeout,
            "starting supervised process"
        );

        let mut child = match self.command().spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = StartError {
                    program: self.descriptor.program.clone(),
                    source,
                };
                warn!(cmd = %self.descriptor, error = %err, "process failed to start");
                return ExecutionResult::start_failed(err);
            }
        };

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let cancel = CancellationToken::new();
        // Stands the watchdog down even if this future is dropped mid-run.
        let _cancel_on_drop = cancel.clone().drop_guard();
        let (deadline_rx, watchdog) = spawn_watchdog(timeout, cancel.clone());

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let (outcome, abort_signal) = {
            let supervised = supervise(&mut child, deadline_rx, &cancel, self.abort_grace);
            let drain = async {
                tokio::join!(
                    read_pipe(stdout_pipe, &mut stdout),
                    read_pipe(stderr_pipe, &mut stderr),
                );
            };
            tokio::pin!(supervised);
            tokio::pin!(drain);

            let mut drained = false;
            let (outcome, abort_signal) = tokio::select! {
                res = supervised.as_mut() => res,
                () = drain.as_mut() => {
                    drained = true;
                    supervised.as_mut().await
                }
            };

            if !drained {
                if matches!(outcome, Outcome::TimedOut) {
                    // A surviving grandchild may hold the pipes open forever.
                    if tokio::time::timeout(self.abort_grace, drain.as_mut()).await.is_err() {
                        warn!(
                            abort_grace = ?self.abort_grace,
                            "output pipes still open after abort; returning captured output"
                        );
                    }
                } else {
                    drain.as_mut().await;
                }
            }

            (outcome, abort_signal)
        };

        if let Err(err) = watchdog.await {
            debug!(error = %err, "watchdog task did not finish cleanly");
        }

        let elapsed = started.elapsed();
        debug!(
            cmd = %self.descriptor,
            ?outcome,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            ?elapsed,
            "supervised process finished"
        );

        ExecutionResult {
            stdout,
            stderr,
            outcome,
            abort_signal,
            elapsed,
        }
    }

    fn command(&self) -> Command {
        let d = &self.descriptor;
        let mut cmd = Command::new(&d.program);

        cmd.args(&d.args)
            .env_clear()
            .envs(merge_env(std::env::vars_os(), &d.env))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &d.working_dir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

/// Spawn the deadline watcher.
///
/// It either sees `cancel` fire and exits quietly, or sleeps out `timeout`
/// and reports through the returned receiver. It never touches the process.
fn spawn_watchdog(
    timeout: Duration,
    cancel: CancellationToken,
) -> (oneshot::Receiver<()>, JoinHandle<()>) {
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("process finished before the deadline; watchdog stood down");
            }
            _ = tokio::time::sleep(timeout) => {
                if tx.send(()).is_err() {
                    debug!("deadline elapsed after the runner stopped listening");
                }
            }
        }
    });

    (rx, handle)
}

/// Wait for the process or the deadline, whichever comes first.
async fn supervise(
    child: &mut Child,
    mut deadline: oneshot::Receiver<()>,
    cancel: &CancellationToken,
    abort_grace: Duration,
) -> (Outcome, Option<AbortSignal>) {
    let exited = tokio::select! {
        biased;
        status = child.wait() => Some(status),
        Ok(()) = &mut deadline => None,
    };

    cancel.cancel();

    match exited {
        Some(Ok(status)) => (Outcome::Completed(exit_code(status)), None),
        Some(Err(err)) => {
            error!(error = %err, "waiting for supervised process failed");
            (Outcome::Completed(-1), None)
        }
        None => {
            warn!("deadline elapsed; aborting process");
            let signal = abort_and_reap(child, abort_grace).await;
            (Outcome::TimedOut, signal)
        }
    }
}

/// Send the abort signal and wait until the process is really gone.
async fn abort_and_reap(child: &mut Child, abort_grace: Duration) -> Option<AbortSignal> {
    let mut delivered = match send_abort(child) {
        Ok(signal) => {
            info!(%signal, "abort signal delivered");
            Some(signal)
        }
        Err(err) => {
            warn!(error = %err, "failed to deliver abort signal");
            None
        }
    };

    match tokio::time::timeout(abort_grace, child.wait()).await {
        Ok(Ok(status)) => {
            debug!(exit_code = exit_code(status), "aborted process terminated");
        }
        Ok(Err(err)) => {
            warn!(error = %err, "waiting for aborted process failed");
        }
        Err(_) => {
            warn!(?abort_grace, "process survived abort signal; killing it");
            match child.kill().await {
                Ok(()) => delivered = Some(AbortSignal::Kill),
                Err(err) => warn!(error = %err, "failed to kill aborted process"),
            }
        }
    }

    delivered
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

async fn read_pipe<R>(pipe: Option<R>, buf: &mut Vec<u8>)
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return;
    };

    // `read_buf` appends as it goes, so bytes survive if this future is
    // dropped mid-read.
    loop {
        match pipe.read_buf(buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, bytes = buf.len(), "reading process output failed");
                break;
            }
        }
    }
}
