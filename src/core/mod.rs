//! # Core Module
//!
//! Configuration, error taxonomy, timezone handling and message utilities.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod clock;
pub mod config;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use clock::Clock;
pub use config::{Config, SchedulerConfig};
pub use error::{ReminderError, Result};
pub use response::{chunk_for_message, chunk_text, MESSAGE_LIMIT};
