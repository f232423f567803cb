//! Reminder record and repeat intervals

use chrono::NaiveDateTime;

use crate::core::error::{ReminderError, Result};

/// Identifier of the conversation that owns a reminder
pub type ChatId = i64;

/// How a reminder's next time advances after it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatInterval {
    None,
    Daily,
    Weekly,
    Monthly,
}

impl RepeatInterval {
    /// Value persisted in the `repeat_interval` column (NULL for `None`)
    pub fn as_db_value(&self) -> Option<&'static str> {
        match self {
            RepeatInterval::None => None,
            RepeatInterval::Daily => Some("daily"),
            RepeatInterval::Weekly => Some("weekly"),
            RepeatInterval::Monthly => Some("monthly"),
        }
    }

    /// Interpret a persisted `repeat_interval` column value
    pub fn from_db_value(raw: Option<&str>) -> Result<Self> {
        match raw {
            None | Some("") => Ok(RepeatInterval::None),
            Some(value) => value.parse(),
        }
    }

    /// Opaque token carried by the repeat-choice buttons
    pub fn button_token(&self) -> &'static str {
        match self {
            RepeatInterval::None => "repeat_none",
            RepeatInterval::Daily => "repeat_daily",
            RepeatInterval::Weekly => "repeat_weekly",
            RepeatInterval::Monthly => "repeat_monthly",
        }
    }

    pub fn from_button_token(token: &str) -> Option<Self> {
        token.strip_prefix("repeat_")?.parse().ok()
    }

    pub fn is_repeating(&self) -> bool {
        !matches!(self, RepeatInterval::None)
    }
}

impl std::fmt::Display for RepeatInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepeatInterval::None => write!(f, "none"),
            RepeatInterval::Daily => write!(f, "daily"),
            RepeatInterval::Weekly => write!(f, "weekly"),
            RepeatInterval::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for RepeatInterval {
    type Err = ReminderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(RepeatInterval::None),
            "daily" => Ok(RepeatInterval::Daily),
            "weekly" => Ok(RepeatInterval::Weekly),
            "monthly" => Ok(RepeatInterval::Monthly),
            _ => Err(ReminderError::InvalidInterval(s.to_string())),
        }
    }
}

/// A persisted reminder
///
/// `repeat_interval` keeps the raw column value so an unrecognized interval
/// survives loading and can be reported instead of silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: i64,
    pub chat_id: ChatId,
    pub owner_label: String,
    pub text: String,
    /// Original trigger moment, immutable
    pub created_time: NaiveDateTime,
    /// Next moment the reminder is due
    pub next_time: NaiveDateTime,
    pub is_active: bool,
    pub repeat_interval: Option<String>,
}

impl Reminder {
    pub fn interval(&self) -> Result<RepeatInterval> {
        RepeatInterval::from_db_value(self.repeat_interval.as_deref())
    }
}
