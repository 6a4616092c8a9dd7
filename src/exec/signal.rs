// src/exec/signal.rs

//! Abort delivery for timed-out processes.
//!
//! On Unix the watchdog sends `SIGABRT`, which makes most runtimes print a
//! stack trace before dying. Elsewhere, or if that fails, the child is
//! force-killed.

use std::fmt;
use std::io;

use tokio::process::Child;
use tracing::warn;

/// Which termination instruction reached the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortSignal {
    /// `SIGABRT`: terminate and dump diagnostic state where supported.
    Abort,
    /// Plain forceful termination (`SIGKILL` / `TerminateProcess`).
    Kill,
}

impl fmt::Display for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortSignal::Abort => f.write_str("SIGABRT"),
            AbortSignal::Kill => f.write_str("kill"),
        }
    }
}

/// Deliver the abort signal, falling back to a forceful kill.
///
/// The child must not have been reaped yet, otherwise its pid may already
/// belong to another process.
pub fn send_abort(child: &mut Child) -> io::Result<AbortSignal> {
    match try_sigabrt(child) {
        Ok(()) => Ok(AbortSignal::Abort),
        Err(err) => {
            warn!(error = %err, "abort signal unavailable; falling back to kill");
            child.start_kill()?;
            Ok(AbortSignal::Kill)
        }
    }
}

#[cfg(unix)]
fn try_sigabrt(child: &Child) -> io::Result<()> {
    let pid = child
        .id()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "process already reaped"))?;

    // SAFETY: `kill` has no memory-safety preconditions; the pid belongs to
    // our un-reaped child.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGABRT) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_sigabrt(_child: &Child) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "SIGABRT is not available on this platform",
    ))
}
