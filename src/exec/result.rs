// src/exec/result.rs

use std::borrow::Cow;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::AbortSignal;

/// Why a process could not be started.
#[derive(Error, Debug)]
#[error("failed to start '{program}': {source}")]
pub struct StartError {
    pub program: PathBuf,
    #[source]
    pub source: io::Error,
}

impl StartError {
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

/// How a supervised invocation ended.
#[derive(Debug)]
pub enum Outcome {
    /// The process exited on its own. The code is `-1` when it was killed by
    /// a signal and has no exit code.
    Completed(i32),
    /// The process never started; no deadline task was spawned.
    StartFailed(StartError),
    /// The deadline elapsed first and the process was aborted.
    TimedOut,
}

/// Everything a caller gets back from [`crate::exec::Runner::run`].
///
/// Output is always complete for whatever the process wrote before it exited
/// or was terminated; it is empty on start failure.
#[derive(Debug)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub outcome: Outcome,
    /// The signal the watchdog delivered, if it had to act at all.
    pub abort_signal: Option<AbortSignal>,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub(crate) fn start_failed(err: StartError) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            outcome: Outcome::StartFailed(err),
            abort_signal: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Completed with exit code 0.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Completed(0))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self.outcome, Outcome::TimedOut)
    }

    pub fn is_start_failure(&self) -> bool {
        matches!(self.outcome, Outcome::StartFailed(_))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.outcome {
            Outcome::Completed(code) => Some(code),
            _ => None,
        }
    }

    /// A failed run that printed nothing on stdout.
    ///
    /// This usually means the tool hung or died early, which is when a rerun
    /// with more verbosity helps most.
    pub fn is_ambiguous_failure(&self) -> bool {
        !self.is_success() && !self.is_start_failure() && self.stdout.is_empty()
    }
}
