//! Per-chat conversation state with per-chat serialization
//!
//! Each chat gets a slot holding what input is expected next. A handler locks
//! the slot for the whole event, so two events from the same chat never race
//! on it while different chats proceed independently. Slots that return to
//! idle are dropped once nobody else is waiting on them.

use dashmap::DashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::features::reminders::ChatId;

/// What the bot expects from a chat next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingReminderText,
    AwaitingDeleteId,
    AwaitingRepeatTargetId,
    /// Waiting for a repeat button for this reminder
    AwaitingRepeatChoice { reminder_id: i64 },
}

impl ConversationState {
    /// Consume the pending state, leaving the chat idle
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }

    pub fn pending_reminder_id(&self) -> Option<i64> {
        match self {
            ConversationState::AwaitingRepeatChoice { reminder_id } => Some(*reminder_id),
            _ => None,
        }
    }
}

type Slot = Arc<Mutex<ConversationState>>;

/// Conversation states of all chats
#[derive(Default)]
pub struct ConversationStates {
    slots: DashMap<ChatId, Slot>,
}

impl ConversationStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a chat's state, creating it on demand
    pub async fn lock(&self, chat_id: ChatId) -> ChatSession<'_> {
        // Clone out of the map first so the shard lock is not held across the await
        let slot = self.slots.entry(chat_id).or_default().clone();
        let guard = slot.lock_owned().await;

        ChatSession {
            chat_id,
            states: self,
            guard,
        }
    }

    /// True while a chat has a pending state or an event in flight
    ///
    /// Does not need the slot lock, so it stays true while another event holds
    /// the session.
    pub fn is_tracked(&self, chat_id: ChatId) -> bool {
        self.slots.contains_key(&chat_id)
    }

    /// Current state of a chat without waiting; idle if absent or busy
    #[cfg(test)]
    pub(crate) fn peek(&self, chat_id: ChatId) -> ConversationState {
        match self.slots.get(&chat_id) {
            Some(slot) => {
                let state = slot.try_lock().map(|state| *state).unwrap_or_default();
                state
            }
            None => ConversationState::Idle,
        }
    }

}

/// Exclusive handle on one chat's state for the duration of an event
pub struct ChatSession<'a> {
    chat_id: ChatId,
    states: &'a ConversationStates,
    guard: OwnedMutexGuard<ConversationState>,
}

impl ChatSession<'_> {
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

impl Deref for ChatSession<'_> {
    type Target = ConversationState;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for ChatSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl Drop for ChatSession<'_> {
    fn drop(&mut self) {
        if !self.guard.is_idle() {
            return;
        }
        // Two owners means the map and this guard: nobody else is waiting
        self.states
            .slots
            .remove_if(&self.chat_id, |_, slot| Arc::strong_count(slot) == 2);
    }
}
