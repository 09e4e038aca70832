//! Weekly pickup-window recurrence expansion.
//!
//! Producers often offer the same pickup slot every week ("Tuesdays
//! 17:00–18:00"). Expansion of that rule into concrete windows happens in
//! exactly one place — here — with explicit caps so a malformed rule can
//! never generate an unbounded schedule.
//!
//! All arithmetic is in UTC; callers that care about local wall time
//! convert before building the rule.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use rpl_schemas::PickupWindow;

/// Hard cap on instances produced per expansion.
pub const MAX_INSTANCES: usize = 52;

/// Hard cap on the expansion horizon, in days.
pub const MAX_HORIZON_DAYS: i64 = 365;

/// A weekly recurrence rule: one window per week on a fixed weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub weekday: Weekday,
    /// Window start, UTC wall time.
    pub start: NaiveTime,
    /// Window length in minutes. Must be > 0 to produce any instances.
    pub duration_minutes: u32,
}

/// Expand a weekly rule into concrete windows.
///
/// Returns every window whose start lies in `[from, from + horizon_days)`,
/// oldest first, capped at [`MAX_INSTANCES`]. `horizon_days` is clamped to
/// [`MAX_HORIZON_DAYS`]. A zero-duration rule expands to nothing.
pub fn expand_recurrence(
    rule: &RecurrenceRule,
    from: DateTime<Utc>,
    horizon_days: i64,
) -> Vec<PickupWindow> {
    if rule.duration_minutes == 0 || horizon_days <= 0 {
        return Vec::new();
    }

    let horizon = from + Duration::days(horizon_days.min(MAX_HORIZON_DAYS));
    let duration = Duration::minutes(i64::from(rule.duration_minutes));

    // First candidate: the rule's weekday on or after `from`'s date.
    let days_ahead = i64::from(
        (rule.weekday.num_days_from_monday() + 7 - from.weekday().num_days_from_monday()) % 7,
    );
    let first_date = from.date_naive() + Duration::days(days_ahead);
    let mut start = first_date
        .and_time(rule.start)
        .and_utc();
    if start < from {
        start += Duration::days(7);
    }

    let mut windows = Vec::new();
    while start < horizon && windows.len() < MAX_INSTANCES {
        windows.push(PickupWindow {
            start,
            end: start + duration,
        });
        start += Duration::days(7);
    }
    windows
}
