// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Run a command under a watchdog timeout and retry it with exponential backoff.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Watchrun.toml` in the current working directory. A missing
    /// default file is fine as long as a command is given after `--`.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Override `[watchdog].timeout` (e.g. "200ms", "60s", "2m").
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Run the command once; never retry on failure.
    #[arg(long)]
    pub no_retry: bool,

    /// Extra environment override for the command (repeatable, last wins).
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Command to run, overriding `[command]` from the config.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    Ok((key.to_string(), value.to_string()))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
