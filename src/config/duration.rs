//! Duration parsing utilities.
//!
//! Readiness settings are written as human-readable strings such as
//! `"200ms"`, `"60s"`, `"2m"` or `"1h"`.

use std::time::Duration;

/// Parse a duration string like "200ms", "60s", "2m", "1h".
///
/// A bare number is read as seconds. Returns `None` for anything else,
/// including negative or fractional values.
///
/// # Examples
///
/// ```
/// use service_topology::config::parse_duration_string;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration_string("200ms"), Some(Duration::from_millis(200)));
/// assert_eq!(parse_duration_string("60s"), Some(Duration::from_secs(60)));
/// assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_duration_string("30"), Some(Duration::from_secs(30)));
/// ```
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return None;
    }
    let value: u64 = digits.parse().ok()?;

    match unit.trim() {
        "ms" => Some(Duration::from_millis(value)),
        "" | "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}
