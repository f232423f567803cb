//! # Reminders Feature
//!
//! Reminder records, recurrence arithmetic and the polling scheduler that
//! delivers due reminders.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Absolute date/time reminders with daily/weekly/monthly repeat
//! - 1.0.0: Initial release

pub mod model;
pub mod notifier;
pub mod recurrence;
pub mod scheduler;

pub use model::{ChatId, Reminder, RepeatInterval};
pub use notifier::Notifier;
pub use recurrence::next_occurrence;
pub use scheduler::{format_delivery, PollReport, ReminderScheduler};
