// src/driver/retry.rs

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::BackoffSequence;
use crate::exec::{CommandDescriptor, ExecutionResult, Runner};

use super::{RetryOptions, RunReport};

/// Runs a command, retrying failures with exponential backoff.
///
/// The runner never retries on its own; this loop decides:
/// - success ends the run;
/// - a start failure ends the run (retrying a missing binary won't help);
/// - timeouts and non-zero exits are retried while the backoff sequence
///   still yields delays and the driver has not been cancelled.
#[derive(Debug, Clone)]
pub struct RetryDriver {
    options: RetryOptions,
    cancel: CancellationToken,
}

impl RetryDriver {
    pub fn new(options: RetryOptions) -> Self {
        Self::with_cancellation(options, CancellationToken::new())
    }

    pub fn with_cancellation(options: RetryOptions, cancel: CancellationToken) -> Self {
        Self { options, cancel }
    }

    /// Token that stops any pending backoff wait and all further attempts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `descriptor` until it succeeds or retries run out.
    ///
    /// The first attempt always runs. Cancellation is observed between
    /// attempts; an attempt already in flight is bounded by its own timeout.
    pub async fn run(&self, descriptor: &CommandDescriptor) -> RunReport {
        let mut delays =
            BackoffSequence::with_cancellation(self.options.backoff, self.cancel.child_token());
        let mut attempts = 0u32;
        let mut verbose_rerun = false;

        loop {
            attempts += 1;
            let mut last = self.attempt(descriptor).await;

            if self.is_final(&last) {
                return self.report(last, attempts, verbose_rerun);
            }
            log_failure(attempts, &last);

            if !verbose_rerun && self.wants_verbose_rerun(&last) {
                verbose_rerun = true;
                attempts += 1;
                last = self.verbose_rerun(descriptor, &last).await;

                if self.is_final(&last) {
                    return self.report(last, attempts, verbose_rerun);
                }
                log_failure(attempts, &last);
            }

            if !self.options.retry_enabled {
                debug!("retries disabled; giving up after first failure");
                return self.report(last, attempts, verbose_rerun);
            }

            let Some(delay) = delays.next() else {
                info!(attempts, "backoff exhausted; giving up");
                return self.report(last, attempts, verbose_rerun);
            };

            info!(attempt = attempts, ?delay, "retrying after backoff");
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(attempts, "retry loop cancelled while waiting");
                    return self.report(last, attempts, verbose_rerun);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt(&self, descriptor: &CommandDescriptor) -> ExecutionResult {
        Runner::new(descriptor.clone())
            .with_abort_grace(self.options.abort_grace)
            .run(self.options.timeout)
            .await
    }

    fn is_final(&self, result: &ExecutionResult) -> bool {
        result.is_success() || result.is_start_failure()
    }

    fn wants_verbose_rerun(&self, result: &ExecutionResult) -> bool {
        !self.options.verbose_rerun_args.is_empty()
            && result.is_ambiguous_failure()
            && !self.cancel.is_cancelled()
    }

    /// One extra run with more verbosity, to get something useful into the
    /// logs when a failure printed nothing.
    async fn verbose_rerun(
        &self,
        descriptor: &CommandDescriptor,
        failed: &ExecutionResult,
    ) -> ExecutionResult {
        warn!(
            outcome = ?failed.outcome,
            stderr = %failed.stderr_lossy(),
            "command failed without stdout; rerunning once with more verbosity"
        );

        let verbose = descriptor.with_extra_args(&self.options.verbose_rerun_args);
        let result = self.attempt(&verbose).await;

        if !result.is_success() {
            warn!(
                outcome = ?result.outcome,
                stdout = %result.stdout_lossy(),
                stderr = %result.stderr_lossy(),
                "verbose rerun failed too"
            );
        }

        result
    }

    fn report(&self, last: ExecutionResult, attempts: u32, verbose_rerun: bool) -> RunReport {
        let cancelled = self.cancel.is_cancelled();
        RunReport {
            last,
            attempts,
            verbose_rerun,
            cancelled,
        }
    }
}

fn log_failure(attempt: u32, result: &ExecutionResult) {
    warn!(
        attempt,
        outcome = ?result.outcome,
        abort_signal = ?result.abort_signal,
        elapsed = ?result.elapsed,
        "command attempt failed"
    );
}
