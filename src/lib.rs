// src/lib.rs

pub mod backoff;
pub mod cli;
pub mod config;
pub mod driver;
pub mod errors;
pub mod exec;
pub mod logging;

use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::validate::validate_command;
use crate::config::{load_and_validate, parse_duration, ConfigFile};
use crate::driver::{RetryDriver, RetryOptions, RunReport};
use crate::errors::{Result, WatchrunError};
use crate::exec::CommandDescriptor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (or defaults when only a CLI command is given)
/// - CLI overrides
/// - the retry driver around the watchdog runner
/// - Ctrl-C handling
///
/// Returns the exit status the process should report.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = resolve_config(&args)?;
    let descriptor = resolve_command(&args, &cfg)?;
    let options = resolve_options(&args, &cfg)?;

    if args.dry_run {
        print_dry_run(&descriptor, &options);
        return Ok(0);
    }

    let driver = RetryDriver::new(options);

    // Ctrl-C → stop retrying.
    {
        let token = driver.cancellation_token();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl-C received; cancelling further attempts");
            token.cancel();
        });
    }

    let report = driver.run(&descriptor).await;
    relay_output(&report)?;

    let code = report.exit_code();
    if report.succeeded() {
        info!(attempts = report.attempts, "command succeeded");
    } else {
        warn!(
            attempts = report.attempts,
            outcome = ?report.last.outcome,
            exit_code = code,
            "command did not succeed"
        );
    }

    Ok(code)
}

/// Load the config file, or fall back to defaults when it is missing and the
/// command comes from the CLI.
fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let path = args.config.as_path();
    if path.exists() {
        debug!(path = %path.display(), "loading config");
        return load_and_validate(path);
    }

    if args.command.is_empty() {
        return Err(WatchrunError::ConfigError(format!(
            "config file {:?} not found and no command given after `--`",
            path
        )));
    }

    debug!(path = %path.display(), "no config file; using defaults");
    Ok(ConfigFile::default())
}

fn resolve_command(args: &CliArgs, cfg: &ConfigFile) -> Result<CommandDescriptor> {
    let descriptor = match args.command.split_first() {
        Some((program, rest)) => CommandDescriptor::new(program).args(rest.iter().cloned()),
        None => cfg.command.clone().ok_or_else(|| {
            WatchrunError::ConfigError(
                "no command configured: add a [command] section or pass one after `--`"
                    .to_string(),
            )
        })?,
    };

    let mut descriptor = descriptor.envs(args.env.iter().cloned());
    if let Some(ref dir) = args.cwd {
        descriptor = descriptor.current_dir(dir);
    }

    validate_command(&descriptor)?;
    Ok(descriptor)
}

fn resolve_options(args: &CliArgs, cfg: &ConfigFile) -> Result<RetryOptions> {
    let mut options = cfg.retry_options();

    if let Some(ref timeout) = args.timeout {
        options.timeout = parse_duration(timeout)?;
        if options.timeout.is_zero() {
            return Err(WatchrunError::ConfigError(
                "--timeout must be > 0".to_string(),
            ));
        }
    }
    if args.no_retry {
        options.retry_enabled = false;
    }

    Ok(options)
}

/// Copy the final attempt's output to our own stdout / stderr.
fn relay_output(report: &RunReport) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&report.last.stdout)?;
    stdout.flush()?;

    let mut stderr = std::io::stderr().lock();
    stderr.write_all(&report.last.stderr)?;
    stderr.flush()?;

    Ok(())
}

/// Simple dry-run output: print the resolved command and retry plan.
fn print_dry_run(descriptor: &CommandDescriptor, options: &RetryOptions) {
    println!("watchrun dry-run");
    println!("  command: {descriptor}");
    if let Some(ref dir) = descriptor.working_dir {
        println!("  cwd: {}", dir.display());
    }
    if !descriptor.env.is_empty() {
        println!("  env:");
        for (key, value) in descriptor.env.iter() {
            println!("    {key}={value}");
        }
    }
    println!();

    println!("  watchdog.timeout = {:?}", options.timeout);
    println!("  watchdog.abort_grace = {:?}", options.abort_grace);
    println!("  retry.enabled = {}", options.retry_enabled);
    if !options.verbose_rerun_args.is_empty() {
        println!("  retry.verbose_rerun_args = {:?}", options.verbose_rerun_args);
    }

    if options.retry_enabled {
        let delays: Vec<_> = backoff::BackoffSequence::new(options.backoff)
            .take(16)
            .collect();
        println!("  backoff delays: {:?}", delays);
    }

    debug!("dry-run complete (no execution)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> CliArgs {
        let mut full = vec!["watchrun", "--config", "/nonexistent/Watchrun.toml"];
        full.extend_from_slice(argv);
        CliArgs::try_parse_from(full).expect("valid args")
    }

    #[test]
    fn missing_config_without_command_is_an_error() {
        let res = resolve_config(&args(&[]));
        assert!(matches!(res, Err(WatchrunError::ConfigError(_))));
    }

    #[test]
    fn cli_command_and_overrides_are_applied() {
        let a = args(&["--env", "K=1", "--env", "K=2", "--cwd", "/tmp", "--no-retry", "--timeout", "3s", "--", "echo", "hi"]);
        let cfg = resolve_config(&a).expect("defaults");
        let d = resolve_command(&a, &cfg).expect("command");
        let o = resolve_options(&a, &cfg).expect("options");

        assert_eq!(d.program, Path::new("echo"));
        assert_eq!(d.args, vec!["hi".to_string()]);
        assert_eq!(d.env.get("K").map(String::as_str), Some("2"));
        assert_eq!(d.working_dir.as_deref(), Some(Path::new("/tmp")));
        assert!(!o.retry_enabled);
        assert_eq!(o.timeout, std::time::Duration::from_secs(3));
    }

    #[test]
    fn zero_timeout_override_is_rejected() {
        let a = args(&["--timeout", "0s", "--", "true"]);
        let cfg = resolve_config(&a).expect("defaults");
        assert!(resolve_options(&a, &cfg).is_err());
    }
}
