//! Next-occurrence arithmetic for repeating reminders
//!
//! Works on wall-clock values in the normalized timezone: a reminder set for
//! 10:00 stays at 10:00 across DST transitions (the elapsed duration between
//! firings is 23h or 25h on those days).

use chrono::{Days, Months, NaiveDateTime};

use super::model::RepeatInterval;
use crate::core::error::{ReminderError, Result};

/// Compute the next occurrence after `previous`
///
/// Monthly recurrence keeps the day of month when the target month has it and
/// clamps to the target month's last day otherwise (Jan 31 -> Feb 28/29).
/// `RepeatInterval::None` is not a recurrence and is rejected.
pub fn next_occurrence(previous: NaiveDateTime, interval: RepeatInterval) -> Result<NaiveDateTime> {
    let next = match interval {
        RepeatInterval::Daily => previous.checked_add_days(Days::new(1)),
        RepeatInterval::Weekly => previous.checked_add_days(Days::new(7)),
        RepeatInterval::Monthly => previous.checked_add_months(Months::new(1)),
        RepeatInterval::None => {
            return Err(ReminderError::InvalidInterval(
                "none is not a recurrence".to_string(),
            ))
        }
    };

    next.ok_or_else(|| {
        ReminderError::InvalidInterval(format!("{interval} overflows the calendar after {previous}"))
    })
}
