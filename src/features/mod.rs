//! # Features Layer
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod conversation;
pub mod reminders;

pub use conversation::{ConversationState, ConversationStates};
pub use reminders::{Notifier, Reminder, ReminderScheduler, RepeatInterval};
