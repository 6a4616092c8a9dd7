// src/backoff/sequence.rs

//! Lazy, cancellable sequence of backoff delays.
//!
//! ```rust
//! use std::time::Duration;
//! use watchrun::backoff::{BackoffParameters, BackoffSequence};
//!
//! let delays: Vec<_> = BackoffSequence::new(BackoffParameters::default()).collect();
//! assert_eq!(delays.len(), 5);
//! assert_eq!(delays.last(), Some(&Duration::from_secs(4)));
//! ```

use std::iter::FusedIterator;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::BackoffParameters;

/// Single-consumer iterator over backoff delays.
///
/// Yields `duration_for(0)`, `duration_for(1)`, ... and stops for good right
/// after yielding a value equal to `max`, or as soon as its cancellation
/// token fires. Once `next()` has returned `None` it keeps returning `None`.
#[derive(Debug)]
pub struct BackoffSequence {
    params: BackoffParameters,
    attempt: u32,
    terminal: bool,
    cancel: CancellationToken,
}

impl BackoffSequence {
    pub fn new(params: BackoffParameters) -> Self {
        Self::with_cancellation(params, CancellationToken::new())
    }

    /// Build a sequence that stops when `cancel` (or any clone of it) fires.
    pub fn with_cancellation(params: BackoffParameters, cancel: CancellationToken) -> Self {
        Self {
            params,
            attempt: 0,
            terminal: false,
            cancel,
        }
    }

    /// A handle that can cancel this sequence from elsewhere.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop producing values. No-op if already exhausted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Number of values emitted so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// True once no further value will ever be produced.
    pub fn is_exhausted(&self) -> bool {
        self.terminal || self.cancel.is_cancelled()
    }
}

impl Iterator for BackoffSequence {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.terminal {
            return None;
        }
        if self.cancel.is_cancelled() {
            trace!(attempt = self.attempt, "backoff sequence cancelled");
            self.terminal = true;
            return None;
        }

        let delay = self.params.duration_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        if delay >= self.params.max {
            trace!(attempt = self.attempt, ?delay, "backoff sequence reached its cap");
            self.terminal = true;
        }

        Some(delay)
    }
}

impl FusedIterator for BackoffSequence {}
