//! Time expression parsing for reminders
//!
//! Two accepted shapes:
//! - relative offsets: `30s`, `5m`, `2h`, `1d`
//! - deadlines: `2024-12-25` or `2024-12-25 14:30`
//!
//! Deadline arithmetic always happens in UTC+9, whatever the host timezone is.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use super::model::ReminderType;

/// Offset of the civil timezone deadlines are interpreted in (UTC+9)
pub const DEADLINE_UTC_OFFSET_SECS: i64 = 9 * 60 * 60;

const DATE_FORMAT: &str = "%Y-%m-%d";

static RELATIVE_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
static DEADLINE_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn relative_pattern() -> Option<&'static Regex> {
    RELATIVE_PATTERN
        .get_or_init(|| Regex::new(r"^(\d+)([smhd])$").ok())
        .as_ref()
}

fn deadline_pattern() -> Option<&'static Regex> {
    DEADLINE_PATTERN
        .get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:\s+(\d{1,2}):(\d{2}))?$").ok())
        .as_ref()
}

/// Split a relative expression into its number (as written) and unit letter
fn split_relative(time_str: &str) -> Option<(String, char)> {
    let lowered = time_str.to_lowercase();
    let caps = relative_pattern()?.captures(&lowered)?;
    let value = caps.get(1)?.as_str().to_string();
    let unit = caps.get(2)?.as_str().chars().next()?;
    Some((value, unit))
}

/// Parse `"<N><s|m|h|d>"` (case-insensitive) into a number of seconds
///
/// Returns `None` for anything else, including values that overflow `i64`.
pub fn parse_relative(time_str: &str) -> Option<i64> {
    let (value, unit) = split_relative(time_str)?;
    let value: i64 = value.parse().ok()?;

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 60 * 60 * 24,
        _ => return None,
    };

    value.checked_mul(multiplier)
}

/// Render a relative expression as a human label, e.g. `"5m"` -> `"5 minutes"`
///
/// Input that is not a relative expression comes back unchanged.
pub fn format_relative(time_str: &str) -> String {
    let Some((value, unit)) = split_relative(time_str) else {
        return time_str.to_string();
    };

    let label = match unit {
        's' => "second",
        'm' => "minute",
        'h' => "hour",
        'd' => "day",
        _ => return time_str.to_string(),
    };

    let plural = if value.trim_start_matches('0') == "1" { "" } else { "s" };
    format!("{value} {label}{plural}")
}

/// One scheduled delivery derived from a deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    /// Seconds since the Unix epoch
    pub time: i64,
    pub kind: ReminderType,
}

/// A parsed deadline with its derived notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineSchedule {
    /// Effective deadline, seconds since the Unix epoch
    pub deadline: i64,
    /// Effective deadline as civil UTC+9 time
    pub deadline_local: NaiveDateTime,
    /// Three-days-before notification first, day-of notification second
    pub notifications: [Notification; 2],
    /// Date exactly as the user wrote it
    pub original_date: String,
    /// Time of day as `HH:MM`, `00:00` when omitted
    pub original_time: String,
    /// Effective deadline as `YYYY-MM-DD HH:MM`
    pub display_deadline: String,
}

/// Parse `"YYYY-MM-DD"` or `"YYYY-MM-DD H:MM"` into a deadline schedule
///
/// A bare date (or an explicit `00:00`) means "by the end of the previous day":
/// the effective deadline becomes 23:59 of the day before. Both notifications
/// fire at 00:00, three days before and on the day of the effective deadline.
pub fn parse_deadline(input: &str) -> Option<DeadlineSchedule> {
    let caps = deadline_pattern()?.captures(input)?;
    let date_str = caps.get(1)?.as_str();

    let (hour, minute) = match (caps.get(2), caps.get(3)) {
        (Some(h), Some(m)) => (h.as_str().parse::<u32>().ok()?, m.as_str().parse::<u32>().ok()?),
        _ => (0, 0),
    };

    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;

    let deadline_local = if hour == 0 && minute == 0 {
        date.checked_sub_signed(Duration::days(1))?
            .and_hms_opt(23, 59, 0)?
    } else {
        date.and_time(time)
    };

    let deadline_day = deadline_local.date();
    let three_days_before = deadline_day
        .checked_sub_signed(Duration::days(3))?
        .and_hms_opt(0, 0, 0)?;
    let day_of = deadline_day.and_hms_opt(0, 0, 0)?;

    Some(DeadlineSchedule {
        deadline: local_to_epoch(deadline_local),
        deadline_local,
        notifications: [
            Notification {
                time: local_to_epoch(three_days_before),
                kind: ReminderType::ThreeDaysBefore,
            },
            Notification {
                time: local_to_epoch(day_of),
                kind: ReminderType::Deadline,
            },
        ],
        original_date: date_str.to_string(),
        original_time: format!("{hour:02}:{minute:02}"),
        display_deadline: deadline_local.format("%Y-%m-%d %H:%M").to_string(),
    })
}

/// Convert civil UTC+9 time to seconds since the Unix epoch
pub fn local_to_epoch(local: NaiveDateTime) -> i64 {
    DateTime::<Utc>::from_naive_utc_and_offset(local, Utc).timestamp() - DEADLINE_UTC_OFFSET_SECS
}

/// Convert seconds since the Unix epoch to civil UTC+9 time
pub fn epoch_to_local(timestamp: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(timestamp.checked_add(DEADLINE_UTC_OFFSET_SECS)?, 0)
        .map(|dt| dt.naive_utc())
}
