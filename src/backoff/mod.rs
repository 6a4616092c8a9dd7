// src/backoff/mod.rs

//! Retry pacing.
//!
//! - [`params`] holds [`BackoffParameters`] and the pure per-attempt formula.
//! - [`sequence`] wraps the parameters in a lazy, cancellable, fused
//!   iterator of wait durations.
//!
//! Nothing in here sleeps; callers wait the yielded durations themselves.

pub mod params;
pub mod sequence;

pub use params::BackoffParameters;
pub use sequence::BackoffSequence;
