// src/driver/options.rs

use std::time::Duration;

use crate::backoff::BackoffParameters;
use crate::exec::{DEFAULT_ABORT_GRACE, DEFAULT_TIMEOUT};

/// Knobs for [`crate::driver::RetryDriver`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    /// Deadline for every single attempt.
    pub timeout: Duration,
    /// Grace period between the abort signal and a forceful kill.
    pub abort_grace: Duration,
    pub backoff: BackoffParameters,
    /// If false, the command runs exactly once (plus the verbose rerun).
    pub retry_enabled: bool,
    /// Arguments appended for the one-off verbose rerun after a failure with
    /// empty stdout. Empty disables the rerun.
    pub verbose_rerun_args: Vec<String>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            abort_grace: DEFAULT_ABORT_GRACE,
            backoff: BackoffParameters::default(),
            retry_enabled: true,
            verbose_rerun_args: Vec::new(),
        }
    }
}
