// src/driver/report.rs

use crate::exec::{ExecutionResult, Outcome};

/// Exit status used when the command timed out (same as coreutils `timeout`).
pub const EXIT_TIMED_OUT: i32 = 124;
/// Exit status used when the command could not be started.
pub const EXIT_START_FAILED: i32 = 127;
/// Exit status used when the run was cancelled (e.g. Ctrl-C).
pub const EXIT_CANCELLED: i32 = 130;

/// Result of a full driver run.
#[derive(Debug)]
pub struct RunReport {
    /// Result of the last attempt that ran.
    pub last: ExecutionResult,
    /// How many times the runner was invoked, the verbose rerun included.
    pub attempts: u32,
    pub verbose_rerun: bool,
    /// The run stopped because the driver's token fired.
    pub cancelled: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.last.is_success()
    }

    /// Exit status a CLI should report for this run.
    pub fn exit_code(&self) -> i32 {
        if self.cancelled && !self.succeeded() {
            return EXIT_CANCELLED;
        }
        match self.last.outcome {
            Outcome::Completed(code) if code >= 0 => code,
            Outcome::Completed(_) => 1,
            Outcome::TimedOut => EXIT_TIMED_OUT,
            Outcome::StartFailed(_) => EXIT_START_FAILED,
        }
    }
}
