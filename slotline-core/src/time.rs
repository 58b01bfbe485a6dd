//! Time utilities: wall-clock parsing and timezone-aware resolution.

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::ScheduleError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse a daily clock time like "09:30".
pub fn parse_clock(s: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| ScheduleError::InvalidInput(format!("invalid clock time '{s}': {e}")))
}

/// Render a clock time as "HH:MM".
pub fn format_clock(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Minutes since midnight (seconds are dropped).
pub fn minutes_of(t: NaiveTime) -> u32 {
    t.num_seconds_from_midnight() / 60
}

/// Resolve a local wall-clock time in `tz` to a UTC instant.
///
/// Gaps and folds (DST) are rejected rather than guessed.
pub fn resolve_local(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, ScheduleError> {
    let dt = tz
        .from_local_datetime(&local)
        .single()
        .ok_or_else(|| ScheduleError::AmbiguousLocalTime {
            local,
            tz: tz.name().to_string(),
        })?;
    Ok(dt.with_timezone(&Utc))
}
