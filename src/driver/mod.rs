// src/driver/mod.rs

//! Retry driver that ties the [`crate::exec`] runner to the
//! [`crate::backoff`] sequence.
//!
//! - [`options`] holds [`RetryOptions`] (timeout, backoff, verbose rerun).
//! - [`retry`] contains the attempt loop ([`RetryDriver`]).
//! - [`report`] is what the loop hands back ([`RunReport`]).

pub mod options;
pub mod report;
pub mod retry;

pub use options::RetryOptions;
pub use report::RunReport;
pub use retry::RetryDriver;
