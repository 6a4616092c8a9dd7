// src/config/mod.rs

//! Configuration loading and validation for watchrun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Turn raw strings into typed durations / backoff parameters and check
//!   them (`validate.rs`, `duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    BackoffSection, CommandSection, ConfigFile, RawConfigFile, RetrySection, WatchdogSection,
};
