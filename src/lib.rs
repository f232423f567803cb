// Core layer - clock, config, errors, message utilities
pub mod core;

// Features layer - reminders and conversation state
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod commands;

// Chat platform adapters
pub mod transport;

pub use commands::{Command, CommandRouter, Keyboard, Reply};
pub use core::{Clock, Config, ReminderError};
pub use database::Database;
pub use features::{ConversationState, Notifier, Reminder, ReminderScheduler, RepeatInterval};
pub use transport::{DiscordNotifier, Handler};
