// src/config/validate.rs

use crate::backoff::BackoffParameters;
use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchrunError};
use crate::exec::CommandDescriptor;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WatchrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let timeout = parse_duration(&raw.watchdog.timeout)?;
        let abort_grace = parse_duration(&raw.watchdog.abort_grace)?;
        if timeout.is_zero() {
            return Err(WatchrunError::ConfigError(
                "[watchdog].timeout must be > 0".to_string(),
            ));
        }

        let backoff = BackoffParameters::new(
            parse_duration(&raw.backoff.min)?,
            parse_duration(&raw.backoff.max)?,
            raw.backoff.step,
        );
        backoff.validate()?;

        let command = raw.command.map(CommandDescriptor::from);
        if let Some(ref cmd) = command {
            validate_command(cmd)?;
        }

        Ok(ConfigFile::new_unchecked(
            timeout,
            abort_grace,
            backoff,
            raw.retry,
            command,
        ))
    }
}

/// Checks shared by config-file and CLI-supplied commands.
pub fn validate_command(cmd: &CommandDescriptor) -> Result<()> {
    if cmd.program.as_os_str().is_empty() {
        return Err(WatchrunError::ConfigError(
            "[command].program must not be empty".to_string(),
        ));
    }
    Ok(())
}
