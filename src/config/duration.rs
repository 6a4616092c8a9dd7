// src/config/duration.rs

use std::time::Duration;

use crate::errors::{Result, WatchrunError};

/// Parse a duration string like `"250ms"`, `"4s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let invalid = |reason: String| WatchrunError::InvalidDuration {
        value: s.to_string(),
        reason,
    };

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty duration string".to_string()));
    }

    // Find the boundary between digits and suffix.
    let idx = trimmed
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| invalid("duration missing unit suffix".to_string()))?;

    let (num_part, unit_part) = trimmed.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| invalid(format!("invalid duration number '{}': {}", num_part, e)))?;
    let unit = unit_part.trim().to_lowercase();

    let secs = |mult: u64| {
        value
            .checked_mul(mult)
            .map(Duration::from_secs)
            .ok_or_else(|| invalid("duration too large".to_string()))
    };

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => secs(1),
        "m" => secs(60),
        "h" => secs(60 * 60),
        _ => Err(invalid(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        ))),
    }
}
