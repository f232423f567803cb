//! Outbound delivery seam

use async_trait::async_trait;

use super::model::ChatId;
use crate::core::error::Result;

/// Sends a message to a chat
///
/// Any failure, transient or permanent, is reported as
/// `ReminderError::Transport`; the scheduler treats them all alike. Timeouts
/// are the implementation's business.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<()>;
}
