//! Wall-clock arithmetic on `HH:MM` strings and minute-of-day integers.

use crate::error::AppError;

pub const MINUTES_PER_DAY: i64 = 1440;

/// Parses `HH:MM` into minutes since midnight, in `0..1440`.
pub fn to_minutes(time: &str) -> Result<u32, AppError> {
    let invalid = || AppError::invalid_time(format!("'{time}' is not a valid HH:MM time"));

    let (hours, minutes) = time.split_once(':').ok_or_else(invalid)?;
    let hours = parse_component(hours).ok_or_else(invalid)?;
    let minutes = parse_component(minutes).ok_or_else(invalid)?;

    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

fn parse_component(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Wraps any minute count into a single day.
pub fn wrap(minutes: i64) -> u32 {
    // rem_euclid of 1440 always fits in u32
    minutes.rem_euclid(MINUTES_PER_DAY) as u32
}

/// Formats a minute count as zero-padded `HH:MM`, wrapping across midnight.
pub fn to_time_string(minutes: i64) -> String {
    let normalized = wrap(minutes);
    format!("{:02}:{:02}", normalized / 60, normalized % 60)
}

/// Moves `time` by `delta` minutes, wrapping across midnight.
pub fn shift(time: &str, delta: i64) -> Result<String, AppError> {
    let minutes = i64::from(to_minutes(time)?);
    Ok(to_time_string(minutes + delta))
}
