//! Error taxonomy for the reminder engine
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use thiserror::Error;

/// Errors raised by the store, the recurrence engine and the command flows
///
/// User-input errors (`Validation`, `NotFound`) are answered at the point of
/// entry. Infrastructure errors (`Store`, `Transport`) are logged by whoever
/// owns the loop they happen in.
#[derive(Error, Debug)]
pub enum ReminderError {
    /// Malformed user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reminder id not owned by the requesting chat
    #[error("Reminder #{0} not found")]
    NotFound(i64),

    /// A repeat interval outside daily/weekly/monthly reached the recurrence engine
    #[error("Invalid repeat interval: {0}")]
    InvalidInterval(String),

    /// The notifier could not deliver a message
    #[error("Transport failure: {0}")]
    Transport(String),

    /// A reminder kept changing under a conditional write
    #[error("Reminder #{0} changed concurrently")]
    Conflict(i64),

    /// Durable storage failed; the operation was not committed
    #[error("Store failure: {0}")]
    Store(#[from] sqlite::Error),
}

impl ReminderError {
    /// True for errors caused by what the user typed
    pub fn is_user_error(&self) -> bool {
        matches!(self, ReminderError::Validation(_) | ReminderError::NotFound(_))
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, ReminderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_are_classified() {
        assert!(ReminderError::Validation("bad".into()).is_user_error());
        assert!(ReminderError::NotFound(3).is_user_error());
        assert!(!ReminderError::InvalidInterval("yearly".into()).is_user_error());
        assert!(!ReminderError::Transport("timeout".into()).is_user_error());
        assert!(!ReminderError::Conflict(3).is_user_error());
    }

    #[test]
    fn test_not_found_message_names_id() {
        assert_eq!(ReminderError::NotFound(12).to_string(), "Reminder #12 not found");
    }
}
