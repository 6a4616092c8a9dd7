// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs exactly one external command per [`Runner`] using
//! `tokio::process::Command`, under a deadline enforced by a watchdog task.
//!
//! - [`descriptor`] describes what to run ([`CommandDescriptor`]).
//! - [`env`] derives the child's environment without touching our own.
//! - [`runner`] owns the spawn / capture / deadline race.
//! - [`signal`] delivers the abort signal on timeout.
//! - [`result`] holds the captured output and the outcome tag.

pub mod descriptor;
pub mod env;
pub mod result;
pub mod runner;
pub mod signal;

pub use descriptor::CommandDescriptor;
pub use env::merge_env;
pub use result::{ExecutionResult, Outcome, StartError};
pub use runner::{Runner, DEFAULT_ABORT_GRACE, DEFAULT_TIMEOUT};
pub use signal::AbortSignal;
