//! Human-readable duration parsing (e.g., "30s", "5m", "1h").

use std::time::Duration;
use thiserror::Error;

/// Error parsing a duration string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid duration '{input}' - expected format like '30s', '5m', '1h', or '1h30m'")]
pub struct DurationParseError {
    input: String,
}

impl DurationParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a human-readable duration string.
///
/// Supports:
/// - Bare numbers (treated as seconds)
/// - `s`/`m`/`h` suffixes
/// - Concatenated groups (`1h30m`)
/// - Whitespace tolerant, case-insensitive
///
/// # Examples
///
/// ```
/// use pgcache::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationParseError::new(s));
    }

    let mut total_secs = 0u64;
    let mut digits = String::new();
    let mut saw_suffix = false;

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if ch.is_whitespace() {
            continue;
        }
        let unit_secs = match ch.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            _ => return Err(DurationParseError::new(s)),
        };
        let value: u64 = digits.parse().map_err(|_| DurationParseError::new(s))?;
        total_secs = value
            .checked_mul(unit_secs)
            .and_then(|group| total_secs.checked_add(group))
            .ok_or_else(|| DurationParseError::new(s))?;
        digits.clear();
        saw_suffix = true;
    }

    if !digits.is_empty() {
        // Trailing bare number: seconds, but only valid as the whole input.
        if saw_suffix {
            return Err(DurationParseError::new(s));
        }
        let value: u64 = digits.parse().map_err(|_| DurationParseError::new(s))?;
        total_secs = value;
    }

    Ok(Duration::from_secs(total_secs))
}

/// Format a duration as the shortest `XhYmZs` string.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    if total == 0 {
        return "0s".to_string();
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}
