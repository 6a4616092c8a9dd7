#![allow(dead_code)]

use std::time::Duration;

use watchrun::backoff::BackoffParameters;
use watchrun::driver::RetryOptions;
use watchrun::exec::CommandDescriptor;

/// `sh -c <script>`; extra args land in `$1`, `$2`, ...
pub fn sh(script: &str) -> CommandDescriptor {
    CommandDescriptor::new("sh").args(["-c", script, "sh"])
}

/// Builder for `RetryOptions` with test-friendly (millisecond) defaults.
pub struct RetryOptionsBuilder {
    options: RetryOptions,
}

impl RetryOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: RetryOptions {
                timeout: Duration::from_secs(5),
                abort_grace: Duration::from_secs(1),
                backoff: BackoffParameters::new(
                    Duration::from_millis(1),
                    Duration::from_millis(4),
                    2.0,
                ),
                retry_enabled: true,
                verbose_rerun_args: Vec::new(),
            },
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn backoff(mut self, min: Duration, max: Duration, step: f64) -> Self {
        self.options.backoff = BackoffParameters::new(min, max, step);
        self
    }

    pub fn retry(mut self, enabled: bool) -> Self {
        self.options.retry_enabled = enabled;
        self
    }

    pub fn verbose_rerun_arg(mut self, arg: &str) -> Self {
        self.options.verbose_rerun_args.push(arg.to_string());
        self
    }

    pub fn build(self) -> RetryOptions {
        self.options
    }
}

impl Default for RetryOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
