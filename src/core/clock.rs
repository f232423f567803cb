//! Wall-clock handling in the normalized timezone
//!
//! All reminder times live as naive wall-clock values in one configured
//! timezone and are persisted as `YYYY-MM-DD HH:MM`, so string order equals
//! chronological order.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::{LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::error::{ReminderError, Result};

/// Persisted form of a reminder time
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M";
/// User-facing form, also the input format
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Source of "now" plus user date parsing, bound to one timezone
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    timezone: Tz,
}

impl Clock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Current wall-clock time in the normalized timezone
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }

    /// Parse `DD.MM.YYYY` + `HH:MM` as a wall-clock moment in this timezone
    ///
    /// Moments skipped by a DST jump do not exist and are rejected. Ambiguous
    /// moments (clocks turned back) are kept as written.
    pub fn parse_user_datetime(&self, date: &str, time: &str) -> Result<NaiveDateTime> {
        let input = format!("{date} {time}");
        // `%Y` alone would take `25` as the year 0025
        if !has_four_digit_year(date) {
            return Err(ReminderError::Validation(format!(
                "'{date}' needs a four-digit year"
            )));
        }
        let naive = NaiveDateTime::parse_from_str(&input, DISPLAY_FORMAT)
            .map_err(|e| ReminderError::Validation(format!("cannot parse '{input}': {e}")))?;

        match self.timezone.from_local_datetime(&naive) {
            LocalResult::None => Err(ReminderError::Validation(format!(
                "{input} does not exist in {}",
                self.timezone.name()
            ))),
            LocalResult::Single(_) | LocalResult::Ambiguous(_, _) => Ok(naive),
        }
    }
}

fn has_four_digit_year(date: &str) -> bool {
    date.rsplit('.')
        .next()
        .is_some_and(|year| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()))
}

pub fn to_storage(time: &NaiveDateTime) -> String {
    time.format(STORAGE_FORMAT).to_string()
}

pub fn from_storage(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, STORAGE_FORMAT).map_err(|e| {
        ReminderError::Validation(format!("stored time '{raw}' is malformed: {e}"))
    })
}

pub fn to_display(time: &NaiveDateTime) -> String {
    time.format(DISPLAY_FORMAT).to_string()
}
