// src/backoff/params.rs

use std::time::Duration;

use crate::errors::{Result, WatchrunError};

/// Parameters of an exponential backoff.
///
/// The delay for attempt `n` (0-indexed) is `min * step^n`, clamped into
/// `[min, max]`. The generator does not reject odd values (zero durations,
/// `min > max`, `step <= 1`); call [`BackoffParameters::validate`] first if the
/// values come from user input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffParameters {
    pub min: Duration,
    pub max: Duration,
    pub step: f64,
}

impl Default for BackoffParameters {
    /// 250ms, doubling, capped at 4s.
    fn default() -> Self {
        Self {
            min: Duration::from_millis(250),
            max: Duration::from_secs(4),
            step: 2.0,
        }
    }
}

impl BackoffParameters {
    pub fn new(min: Duration, max: Duration, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Delay for the given attempt.
    ///
    /// The lower bound is checked before the upper bound, so malformed
    /// parameters with `min > max` settle on `max`. Products that overflow or
    /// are not finite also settle on `max`.
    pub fn duration_for(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let nanos = self.min.as_nanos() as f64 * self.step.powi(exp);

        if !nanos.is_finite() {
            return self.max;
        }
        if nanos < self.min.as_nanos() as f64 {
            return self.min;
        }
        if nanos > self.max.as_nanos() as f64 {
            return self.max;
        }

        let candidate = Duration::from_nanos(nanos as u64);
        // f64 -> u64 rounding can push a value sitting right at the cap
        // over it.
        candidate.clamp(self.min.min(self.max), self.max)
    }

    /// Check the preconditions the generator itself does not enforce.
    pub fn validate(&self) -> Result<()> {
        if self.min.is_zero() || self.max.is_zero() {
            return Err(WatchrunError::ConfigError(format!(
                "backoff durations must be positive (min={:?}, max={:?})",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(WatchrunError::ConfigError(format!(
                "backoff min ({:?}) must not exceed max ({:?})",
                self.min, self.max
            )));
        }
        if !(self.step.is_finite() && self.step > 1.0) {
            return Err(WatchrunError::ConfigError(format!(
                "backoff step must be a finite number > 1 (got {})",
                self.step
            )));
        }
        Ok(())
    }
}
