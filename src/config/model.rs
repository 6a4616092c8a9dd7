// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::backoff::BackoffParameters;
use crate::driver::RetryOptions;
use crate::exec::CommandDescriptor;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watchdog]
/// timeout = "60s"
/// abort_grace = "5s"
///
/// [backoff]
/// min = "250ms"
/// max = "4s"
/// step = 2.0
///
/// [retry]
/// enabled = true
/// verbose_rerun_args = ["-vv"]
///
/// [command]
/// program = "syft"
/// args = ["packages", "dir:."]
///
/// [command.env]
/// SYFT_CHECK_FOR_APP_UPDATE = "false"
/// ```
///
/// All sections are optional and have reasonable defaults; `[command]` may
/// also come from the CLI instead.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watchdog: WatchdogSection,

    #[serde(default)]
    pub backoff: BackoffSection,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub command: Option<CommandSection>,
}

/// `[watchdog]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogSection {
    /// Per-attempt deadline.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// How long an aborted process may linger before it is killed outright.
    #[serde(default = "default_abort_grace")]
    pub abort_grace: String,
}

fn default_timeout() -> String {
    "60s".to_string()
}

fn default_abort_grace() -> String {
    "5s".to_string()
}

impl Default for WatchdogSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            abort_grace: default_abort_grace(),
        }
    }
}

/// `[backoff]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffSection {
    #[serde(default = "default_backoff_min")]
    pub min: String,

    #[serde(default = "default_backoff_max")]
    pub max: String,

    /// Multiplicative factor between consecutive delays; must be > 1.
    #[serde(default = "default_backoff_step")]
    pub step: f64,
}

fn default_backoff_min() -> String {
    "250ms".to_string()
}

fn default_backoff_max() -> String {
    "4s".to_string()
}

fn default_backoff_step() -> f64 {
    2.0
}

impl Default for BackoffSection {
    fn default() -> Self {
        Self {
            min: default_backoff_min(),
            max: default_backoff_max(),
            step: default_backoff_step(),
        }
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_retry_enabled")]
    pub enabled: bool,

    /// Extra arguments for a single verbose rerun after a failure that
    /// printed nothing on stdout. Empty (default) disables the rerun.
    #[serde(default)]
    pub verbose_rerun_args: Vec<String>,
}

fn default_retry_enabled() -> bool {
    true
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            enabled: default_retry_enabled(),
            verbose_rerun_args: Vec::new(),
        }
    }
}

/// `[command]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSection {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Environment overrides on top of the inherited environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl From<CommandSection> for CommandDescriptor {
    fn from(section: CommandSection) -> Self {
        let descriptor = CommandDescriptor::new(section.program)
            .args(section.args)
            .envs(section.env);
        match section.cwd {
            Some(dir) => descriptor.current_dir(dir),
            None => descriptor,
        }
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so durations are parsed and backoff parameters are known to be sane.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub timeout: Duration,
    pub abort_grace: Duration,
    pub backoff: BackoffParameters,
    pub retry_enabled: bool,
    pub verbose_rerun_args: Vec<String>,
    pub command: Option<CommandDescriptor>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        timeout: Duration,
        abort_grace: Duration,
        backoff: BackoffParameters,
        retry: RetrySection,
        command: Option<CommandDescriptor>,
    ) -> Self {
        Self {
            timeout,
            abort_grace,
            backoff,
            retry_enabled: retry.enabled,
            verbose_rerun_args: retry.verbose_rerun_args,
            command,
        }
    }

    /// Driver options derived from this config.
    pub fn retry_options(&self) -> RetryOptions {
        RetryOptions {
            timeout: self.timeout,
            abort_grace: self.abort_grace,
            backoff: self.backoff,
            retry_enabled: self.retry_enabled,
            verbose_rerun_args: self.verbose_rerun_args.clone(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let defaults = RetryOptions::default();
        Self {
            timeout: defaults.timeout,
            abort_grace: defaults.abort_grace,
            backoff: defaults.backoff,
            retry_enabled: defaults.retry_enabled,
            verbose_rerun_args: defaults.verbose_rerun_args,
            command: None,
        }
    }
}
