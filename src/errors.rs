// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Runner and backoff outcomes are plain values (see [`crate::exec::Outcome`]);
//! only the config / CLI plumbing reports failures through this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WatchrunError>;
