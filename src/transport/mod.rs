//! # Transport Layer
//!
//! Chat platform adapters. Discord is the only one.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod discord;

pub use discord::{register_commands, DiscordNotifier, Handler};
