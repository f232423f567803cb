//! # Discord Transport
//!
//! Bridges Discord to the reminder core: slash commands, button presses and
//! channel messages become router calls, router replies become Discord
//! messages, and due reminders are delivered through [`DiscordNotifier`].
//! A Discord channel (or DM channel) plays the role of a chat.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use async_trait::async_trait;
use log::{error, info, warn};
use serenity::builder::{CreateApplicationCommand, CreateComponents};
use serenity::http::Http;
use serenity::model::application::command::Command as ApplicationCommand;
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::{Context, EventHandler};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::commands::{Command, CommandRouter, Keyboard, Reply};
use crate::core::error::{ReminderError, Result};
use crate::core::response::chunk_for_message;
use crate::features::reminders::{ChatId, Notifier};

/// Upper bound for one outbound Discord call
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Buttons per action row
const BUTTONS_PER_ROW: usize = 2;

fn channel_for(chat_id: ChatId) -> Result<ChannelId> {
    u64::try_from(chat_id)
        .map(ChannelId)
        .map_err(|_| ReminderError::Transport(format!("{chat_id} is not a Discord channel id")))
}

fn chat_for(channel_id: ChannelId) -> ChatId {
    channel_id.0 as ChatId
}

/// Render a keyboard into Discord action rows
pub fn add_keyboard(components: &mut CreateComponents, keyboard: Keyboard) -> &mut CreateComponents {
    for row in keyboard.buttons().chunks(BUTTONS_PER_ROW) {
        components.create_action_row(|action_row| {
            for button in row {
                action_row.create_button(|b| {
                    b.custom_id(button.token)
                        .label(button.label)
                        .style(ButtonStyle::Secondary)
                });
            }
            action_row
        });
    }
    components
}

/// Slash command definitions for every router command
pub fn create_slash_commands() -> Vec<CreateApplicationCommand> {
    Command::ALL
        .into_iter()
        .map(|command| {
            let mut definition = CreateApplicationCommand::default();
            definition
                .name(command.name())
                .description(command.description());
            definition
        })
        .collect()
}

/// Register slash commands on one guild (instant) or globally
pub async fn register_commands(http: &Http, guild_id: Option<GuildId>) -> anyhow::Result<()> {
    let definitions = create_slash_commands();
    let count = definitions.len();

    match guild_id {
        Some(guild_id) => {
            guild_id
                .set_application_commands(http, |commands| {
                    for definition in definitions {
                        commands.add_application_command(definition);
                    }
                    commands
                })
                .await?;
            info!("Registered {count} slash commands for guild {guild_id}");
        }
        None => {
            ApplicationCommand::set_global_application_commands(http, |commands| {
                for definition in definitions {
                    commands.add_application_command(definition);
                }
                commands
            })
            .await?;
            info!("Registered {count} slash commands globally (may take up to 1 hour to propagate)");
        }
    }
    Ok(())
}

/// Split a reply into Discord-sized messages, keyboard on the last one
pub fn reply_messages(reply: &Reply) -> Vec<(String, Option<Keyboard>)> {
    let mut chunks = chunk_for_message(&reply.text);
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    let last = chunks.len() - 1;

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| (chunk, (i == last).then_some(reply.keyboard)))
        .collect()
}

/// Send a router reply to a channel
pub async fn send_reply(http: &Http, channel_id: ChannelId, reply: &Reply) -> anyhow::Result<()> {
    for (chunk, keyboard) in reply_messages(reply) {
        channel_id
            .send_message(http, |m| {
                m.content(&chunk);
                if let Some(keyboard) = keyboard {
                    m.components(|c| add_keyboard(c, keyboard));
                }
                m
            })
            .await?;
    }
    Ok(())
}

/// Delivers reminder messages to Discord channels
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let channel_id = channel_for(chat_id)?;

        for chunk in chunk_for_message(text) {
            timeout(SEND_TIMEOUT, channel_id.say(&self.http, chunk))
                .await
                .map_err(|_| {
                    ReminderError::Transport(format!("send to {channel_id} timed out"))
                })?
                .map_err(|e| ReminderError::Transport(e.to_string()))?;
        }
        Ok(())
    }
}

/// Gateway event handler feeding the command router
pub struct Handler {
    router: Arc<CommandRouter>,
    guild_id: Option<GuildId>,
}

impl Handler {
    pub fn new(router: Arc<CommandRouter>, guild_id: Option<GuildId>) -> Self {
        Self { router, guild_id }
    }

    async fn respond_to_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> anyhow::Result<()> {
        let chat_id = chat_for(command.channel_id);
        let Some(parsed) = Command::from_name(&command.data.name) else {
            warn!("Unknown slash command '{}'", command.data.name);
            return Ok(());
        };

        let reply = self
            .router
            .handle_command(chat_id, &command.user.name, parsed)
            .await;

        let mut messages = reply_messages(&reply).into_iter();
        let Some((first, keyboard)) = messages.next() else {
            return Ok(());
        };

        command
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message.content(&first);
                        if let Some(keyboard) = keyboard {
                            message.components(|c| add_keyboard(c, keyboard));
                        }
                        message
                    })
            })
            .await?;

        for (chunk, keyboard) in messages {
            command
                .create_followup_message(&ctx.http, |followup| {
                    followup.content(&chunk);
                    if let Some(keyboard) = keyboard {
                        followup.components(|c| add_keyboard(c, keyboard));
                    }
                    followup
                })
                .await?;
        }
        Ok(())
    }

    async fn respond_to_component(
        &self,
        ctx: &Context,
        component: &MessageComponentInteraction,
    ) -> anyhow::Result<()> {
        let chat_id = chat_for(component.channel_id);
        let reply = self
            .router
            .handle_button(chat_id, &component.user.name, &component.data.custom_id)
            .await;

        let mut messages = reply_messages(&reply).into_iter();
        let Some((first, keyboard)) = messages.next() else {
            return Ok(());
        };

        component
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message.content(&first);
                        if let Some(keyboard) = keyboard {
                            message.components(|c| add_keyboard(c, keyboard));
                        }
                        message
                    })
            })
            .await?;

        for (chunk, keyboard) in messages {
            component
                .create_followup_message(&ctx.http, |followup| {
                    followup.content(&chunk);
                    if let Some(keyboard) = keyboard {
                        followup.components(|c| add_keyboard(c, keyboard));
                    }
                    followup
                })
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let chat_id = chat_for(msg.channel_id);
        let bot_id = ctx.cache.current_user_id();
        let mentioned = msg.mentions.iter().any(|user| user.id == bot_id);

        // In guild channels only talk when addressed or mid-conversation
        if msg.guild_id.is_some() && !mentioned && !self.router.has_conversation(chat_id) {
            return;
        }

        let text = msg
            .content
            .replace(&format!("<@{}>", bot_id.0), "")
            .replace(&format!("<@!{}>", bot_id.0), "");
        let text = text.trim();
        let owner = msg.author.name.as_str();

        let command = text
            .strip_prefix('/')
            .and_then(|name| Command::from_name(name.split_whitespace().next().unwrap_or_default()));
        let reply = match command {
            Some(command) => self.router.handle_command(chat_id, owner, command).await,
            None => self.router.handle_text(chat_id, owner, text).await,
        };

        if let Err(e) = send_reply(&ctx.http, msg.channel_id, &reply).await {
            error!("[chat {chat_id}] Failed to send reply: {e}");
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());

        if let Some(guild_id) = self.guild_id {
            info!("🔧 Development mode: registering commands for guild {guild_id}");
        }
        if let Err(e) = register_commands(&ctx.http, self.guild_id).await {
            error!("❌ Failed to register slash commands: {e}");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                if let Err(e) = self.respond_to_command(&ctx, &command).await {
                    error!("Error handling slash command '{}': {e}", command.data.name);
                }
            }
            Interaction::MessageComponent(component) => {
                if let Err(e) = self.respond_to_component(&ctx, &component).await {
                    error!(
                        "Error handling component interaction '{}': {e}",
                        component.data.custom_id
                    );
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::response::MESSAGE_LIMIT;

    #[test]
    fn test_keyboards_render_in_rows_of_two() {
        let mut components = CreateComponents::default();
        add_keyboard(&mut components, Keyboard::MainMenu);
        assert_eq!(components.0.len(), 2);

        let mut components = CreateComponents::default();
        add_keyboard(&mut components, Keyboard::RepeatChoice);
        assert_eq!(components.0.len(), 2);

        let mut components = CreateComponents::default();
        add_keyboard(&mut components, Keyboard::Remove);
        assert!(components.0.is_empty());
    }

    #[test]
    fn test_slash_commands_cover_every_command() {
        let names: Vec<String> = create_slash_commands()
            .iter()
            .filter_map(|c| c.0.get("name").and_then(|v| v.as_str()).map(String::from))
            .collect();
        assert_eq!(names.len(), Command::ALL.len());
        for command in Command::ALL {
            assert!(names.iter().any(|n| n == command.name()));
        }
    }

    #[test]
    fn test_long_reply_is_split_with_keyboard_on_last_message() {
        let line = "🆔 **1**: ⏰ 01.02.2026 09:00\n✏️ Coffee with a long description\n\n";
        let reply = Reply::menu(line.repeat(120));
        assert!(reply.text.chars().count() > MESSAGE_LIMIT);

        let messages = reply_messages(&reply);
        assert!(messages.len() > 1);
        for (chunk, _) in &messages {
            assert!(chunk.chars().count() <= MESSAGE_LIMIT);
        }
        let (last, others) = messages.split_last().unwrap();
        assert_eq!(last.1, Some(Keyboard::MainMenu));
        assert!(others.iter().all(|(_, keyboard)| keyboard.is_none()));
    }

    #[test]
    fn test_short_reply_is_one_message() {
        let reply = Reply::new("✏️ Введите ID", Keyboard::Remove);
        assert_eq!(
            reply_messages(&reply),
            vec![("✏️ Введите ID".to_string(), Some(Keyboard::Remove))]
        );
    }

    #[test]
    fn test_chat_and_channel_ids_map_both_ways() {
        let channel = ChannelId(1_234_567_890_123);
        assert_eq!(channel_for(chat_for(channel)).unwrap(), channel);
        assert!(matches!(channel_for(-5), Err(ReminderError::Transport(_))));
    }
}
