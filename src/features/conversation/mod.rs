//! # Conversation Feature
//!
//! Tracks, per chat, which follow-up input a multi-step command is waiting
//! for. Every flow ends idle; a pending state is consumed by the very next
//! text or button event whether it succeeds or not.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod state;

pub use state::{ChatSession, ConversationState, ConversationStates};
