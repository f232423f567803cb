//! Routes commands, button presses and free text to the reminder flows
//!
//! Every entry point locks the chat's conversation state for the whole event
//! and consumes any pending state before doing work, so a failed step always
//! leaves the chat idle.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use log::{error, info, warn};

use super::messages;
use super::{Command, Keyboard, Reply};
use crate::core::clock::{to_storage, Clock};
use crate::core::error::{ReminderError, Result};
use crate::database::Database;
use crate::features::conversation::{ChatSession, ConversationState, ConversationStates};
use crate::features::reminders::{ChatId, RepeatInterval};

pub struct CommandRouter {
    database: Database,
    conversations: ConversationStates,
    clock: Clock,
}

impl CommandRouter {
    pub fn new(database: Database, clock: Clock) -> Self {
        Self {
            database,
            conversations: ConversationStates::new(),
            clock,
        }
    }

    /// True while a chat is mid-conversation or has an event in flight
    pub fn has_conversation(&self, chat_id: ChatId) -> bool {
        self.conversations.is_tracked(chat_id)
    }

    #[cfg(test)]
    pub(crate) fn conversation_state(&self, chat_id: ChatId) -> ConversationState {
        self.conversations.peek(chat_id)
    }

    /// A named command (slash command or menu button)
    pub async fn handle_command(&self, chat_id: ChatId, owner: &str, command: Command) -> Reply {
        let mut session = self.conversations.lock(chat_id).await;
        self.run_command(&mut session, owner, command).await
    }

    /// A button press carrying an opaque token
    pub async fn handle_button(&self, chat_id: ChatId, owner: &str, token: &str) -> Reply {
        let mut session = self.conversations.lock(chat_id).await;

        if let Some(command) = Command::from_button_token(token) {
            return self.run_command(&mut session, owner, command).await;
        }

        let Some(reminder_id) = session.take().pending_reminder_id() else {
            warn!("[chat {chat_id}] {owner} pressed '{token}' outside of a repeat choice");
            return Reply::menu(messages::WRONG_CONTEXT);
        };
        let Some(interval) = RepeatInterval::from_button_token(token) else {
            warn!("[chat {chat_id}] {owner} sent unknown repeat token '{token}'");
            return Reply::menu(messages::UNKNOWN_CHOICE);
        };
        self.apply_repeat_choice(chat_id, owner, reminder_id, interval)
            .await
            .unwrap_or_else(|e| failure(chat_id, "set repeat", e))
    }

    /// Free text, interpreted by what the chat is waiting for
    pub async fn handle_text(&self, chat_id: ChatId, owner: &str, text: &str) -> Reply {
        let mut session = self.conversations.lock(chat_id).await;

        if let Some(command) = Command::from_menu_label(text) {
            return self.run_command(&mut session, owner, command).await;
        }

        match session.take() {
            ConversationState::AwaitingReminderText => self
                .create_from_line(chat_id, owner, text)
                .await
                .unwrap_or_else(|e| failure(chat_id, "create reminder", e)),
            ConversationState::AwaitingDeleteId => self
                .delete_by_id(chat_id, owner, text)
                .await
                .unwrap_or_else(|e| failure(chat_id, "delete reminder", e)),
            ConversationState::AwaitingRepeatTargetId => self
                .select_repeat_target(&mut session, owner, text)
                .await
                .unwrap_or_else(|e| failure(chat_id, "select repeat target", e)),
            ConversationState::Idle | ConversationState::AwaitingRepeatChoice { .. } => {
                Reply::menu(messages::NOT_UNDERSTOOD)
            }
        }
    }

    async fn run_command(&self, session: &mut ChatSession<'_>, owner: &str, command: Command) -> Reply {
        let chat_id = session.chat_id();
        info!("[chat {chat_id}] {owner} issued /{}", command.name());

        match command {
            Command::Start | Command::Help => {
                session.take();
                Reply::menu(messages::WELCOME)
            }
            Command::List => {
                session.take();
                self.list(chat_id)
                    .await
                    .unwrap_or_else(|e| failure(chat_id, "list reminders", e))
            }
            Command::Create => {
                **session = ConversationState::AwaitingReminderText;
                Reply::new(messages::ASK_REMINDER, Keyboard::Remove)
            }
            Command::Delete => {
                **session = ConversationState::AwaitingDeleteId;
                Reply::new(messages::ASK_DELETE_ID, Keyboard::Remove)
            }
            Command::SetRepeat => {
                **session = ConversationState::AwaitingRepeatTargetId;
                Reply::new(messages::ASK_REPEAT_ID, Keyboard::Remove)
            }
        }
    }

    async fn list(&self, chat_id: ChatId) -> Result<Reply> {
        let reminders = self.database.get_active_reminders(chat_id).await?;
        info!("[chat {chat_id}] Listed {} active reminder(s)", reminders.len());

        if reminders.is_empty() {
            return Ok(Reply::menu(messages::NO_REMINDERS));
        }
        Ok(Reply::menu(messages::reminder_list(&reminders)))
    }

    async fn create_from_line(&self, chat_id: ChatId, owner: &str, line: &str) -> Result<Reply> {
        let Some((date, time, text)) = split_reminder_line(line) else {
            warn!("[chat {chat_id}] {owner} sent a malformed reminder: '{line}'");
            return Ok(Reply::menu(messages::FORMAT_ERROR));
        };

        let trigger_time = self.clock.parse_user_datetime(date, time)?;
        let id = self
            .database
            .add_reminder(chat_id, owner, text, trigger_time)
            .await?;

        info!(
            "[chat {chat_id}] {owner} created reminder #{id} for {}: {text}",
            to_storage(&trigger_time)
        );
        Ok(Reply::menu(messages::created(id, date, time, text)))
    }

    async fn delete_by_id(&self, chat_id: ChatId, owner: &str, text: &str) -> Result<Reply> {
        let Some(id) = parse_id(text) else {
            warn!("[chat {chat_id}] {owner} sent a non-numeric id to delete: '{text}'");
            return Ok(Reply::menu(messages::NUMERIC_ID));
        };

        if self.database.delete_reminder(id, chat_id).await? {
            info!("[chat {chat_id}] {owner} deleted reminder #{id}");
            Ok(Reply::menu(messages::deleted(id)))
        } else {
            Err(ReminderError::NotFound(id))
        }
    }

    async fn select_repeat_target(
        &self,
        session: &mut ChatSession<'_>,
        owner: &str,
        text: &str,
    ) -> Result<Reply> {
        let chat_id = session.chat_id();
        let Some(id) = parse_id(text) else {
            warn!("[chat {chat_id}] {owner} sent a non-numeric id to repeat: '{text}'");
            return Ok(Reply::menu(messages::NUMERIC_ID));
        };

        let reminder = self
            .database
            .get_reminder(id, chat_id)
            .await?
            .ok_or(ReminderError::NotFound(id))?;

        info!(
            "[chat {chat_id}] {owner} is choosing a repeat for reminder #{id}: {}",
            reminder.text
        );
        **session = ConversationState::AwaitingRepeatChoice { reminder_id: id };
        Ok(Reply::new(messages::choose_interval(id), Keyboard::RepeatChoice))
    }

    async fn apply_repeat_choice(
        &self,
        chat_id: ChatId,
        owner: &str,
        reminder_id: i64,
        interval: RepeatInterval,
    ) -> Result<Reply> {
        if !self
            .database
            .set_repeat_interval(reminder_id, chat_id, interval)
            .await?
        {
            return Err(ReminderError::NotFound(reminder_id));
        }

        info!("[chat {chat_id}] {owner} set repeat of reminder #{reminder_id} to {interval}");
        Ok(Reply::menu(messages::repeat_updated(reminder_id, interval)))
    }
}

/// Answer a failed flow; user errors get a specific reply, the rest a generic one
fn failure(chat_id: ChatId, action: &str, error: ReminderError) -> Reply {
    if !error.is_user_error() {
        error!("[chat {chat_id}] Failed to {action}: {error}");
        return Reply::menu(messages::OPERATION_FAILED);
    }

    warn!("[chat {chat_id}] Could not {action}: {error}");
    match error {
        ReminderError::NotFound(id) => Reply::menu(messages::not_found(id)),
        _ => Reply::menu(messages::FORMAT_ERROR),
    }
}

/// Split `<date> <time> <text>`; the text keeps its inner whitespace
fn split_reminder_line(line: &str) -> Option<(&str, &str, &str)> {
    let (date, rest) = line.trim().split_once(char::is_whitespace)?;
    let (time, text) = rest.trim_start().split_once(char::is_whitespace)?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some((date, time, text))
}

fn parse_id(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::sync::Arc;

    const CHAT: ChatId = 100;
    const OTHER_CHAT: ChatId = 200;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    async fn setup() -> (Database, CommandRouter) {
        let database = Database::new(":memory:").await.unwrap();
        let router = CommandRouter::new(database.clone(), Clock::new(chrono_tz::Europe::Moscow));
        (database, router)
    }

    async fn create(router: &CommandRouter, chat_id: ChatId, line: &str) -> Reply {
        router.handle_command(chat_id, "alice", Command::Create).await;
        router.handle_text(chat_id, "alice", line).await
    }

    #[test]
    fn test_split_reminder_line() {
        assert_eq!(
            split_reminder_line("20.10.2025 10:00 Позвонить  маме"),
            Some(("20.10.2025", "10:00", "Позвонить  маме"))
        );
        assert_eq!(
            split_reminder_line("  20.10.2025   10:00   tea "),
            Some(("20.10.2025", "10:00", "tea"))
        );
        assert_eq!(split_reminder_line("20.10.2025 10:00"), None);
        assert_eq!(split_reminder_line("20.10.2025 10:00   "), None);
        assert_eq!(split_reminder_line("tea"), None);
    }

    #[tokio::test]
    async fn test_create_flow_stores_reminder() {
        let (db, router) = setup().await;

        let prompt = router.handle_command(CHAT, "alice", Command::Create).await;
        assert_eq!(prompt.keyboard, Keyboard::Remove);
        assert_eq!(
            router.conversation_state(CHAT),
            ConversationState::AwaitingReminderText
        );

        let reply = router
            .handle_text(CHAT, "alice", "31.12.2025 23:59 Годовщина свадьбы")
            .await;
        assert!(reply.text.contains("Напоминание создано"));
        assert_eq!(reply.keyboard, Keyboard::MainMenu);
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);

        let reminders = db.get_active_reminders(CHAT).await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].text, "Годовщина свадьбы");
        assert_eq!(reminders[0].owner_label, "alice");
        assert_eq!(reminders[0].next_time, at(2025, 12, 31, 23, 59));
        assert!(reminders[0].is_active);
    }

    #[tokio::test]
    async fn test_malformed_reminder_resets_to_idle() {
        let (db, router) = setup().await;

        let reply = create(&router, CHAT, "31.13.2025 23:59 Nope").await;
        assert_eq!(reply.text, messages::FORMAT_ERROR);
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);

        let reply = create(&router, CHAT, "tomorrow").await;
        assert_eq!(reply.text, messages::FORMAT_ERROR);
        assert!(db.get_active_reminders(CHAT).await.unwrap().is_empty());

        // The next line is not taken as a reminder any more
        let reply = router.handle_text(CHAT, "alice", "01.01.2026 10:00 x").await;
        assert_eq!(reply.text, messages::NOT_UNDERSTOOD);
    }

    #[tokio::test]
    async fn test_two_digit_year_is_a_format_error() {
        let (db, router) = setup().await;

        let reply = create(&router, CHAT, "20.10.25 10:00 Позвонить маме").await;
        assert_eq!(reply.text, messages::FORMAT_ERROR);
        assert!(db.get_active_reminders(CHAT).await.unwrap().is_empty());
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);
    }

    #[test]
    fn test_failure_replies_by_error_kind() {
        assert_eq!(
            failure(CHAT, "delete reminder", ReminderError::NotFound(4)),
            Reply::menu(messages::not_found(4))
        );
        assert_eq!(
            failure(CHAT, "create reminder", ReminderError::Validation("bad".into())),
            Reply::menu(messages::FORMAT_ERROR)
        );
        assert_eq!(
            failure(CHAT, "list reminders", ReminderError::Transport("down".into())),
            Reply::menu(messages::OPERATION_FAILED)
        );
    }

    #[tokio::test]
    async fn test_pending_conversation_is_visible_to_transport() {
        let (_db, router) = setup().await;
        assert!(!router.has_conversation(CHAT));

        router.handle_command(CHAT, "alice", Command::Delete).await;
        assert!(router.has_conversation(CHAT));

        router.handle_text(CHAT, "alice", "nope").await;
        assert!(!router.has_conversation(CHAT));
    }

    #[tokio::test]
    async fn test_text_while_idle_not_understood() {
        let (_db, router) = setup().await;
        let reply = router.handle_text(CHAT, "alice", "hello").await;
        assert_eq!(reply, Reply::menu(messages::NOT_UNDERSTOOD));
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_list_shows_repeat_and_is_empty_for_new_chat() {
        let (db, router) = setup().await;

        let empty = router.handle_command(CHAT, "alice", Command::List).await;
        assert_eq!(empty.text, messages::NO_REMINDERS);

        create(&router, CHAT, "01.02.2026 09:00 Coffee").await;
        let id = db.get_active_reminders(CHAT).await.unwrap()[0].id;
        db.set_repeat_interval(id, CHAT, RepeatInterval::Daily).await.unwrap();

        let list = router.handle_command(CHAT, "alice", Command::List).await;
        assert!(list.text.contains(&format!("🆔 **{id}**: ⏰ 01.02.2026 09:00 (повтор: ежедневно)")));
        assert!(list.text.contains("Coffee"));
    }

    #[tokio::test]
    async fn test_delete_flow() {
        let (db, router) = setup().await;
        create(&router, CHAT, "01.02.2026 09:00 Coffee").await;
        let id = db.get_active_reminders(CHAT).await.unwrap()[0].id;

        router.handle_command(CHAT, "alice", Command::Delete).await;
        assert_eq!(router.conversation_state(CHAT), ConversationState::AwaitingDeleteId);

        let reply = router.handle_text(CHAT, "alice", &format!(" {id} ")).await;
        assert_eq!(reply.text, messages::deleted(id));
        assert!(db.get_active_reminders(CHAT).await.unwrap().is_empty());
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_delete_non_numeric_id_resets_to_idle() {
        let (_db, router) = setup().await;
        router.handle_command(CHAT, "alice", Command::Delete).await;

        let reply = router.handle_text(CHAT, "alice", "first one").await;
        assert_eq!(reply.text, messages::NUMERIC_ID);
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_delete_from_other_chat_reports_not_found() {
        let (db, router) = setup().await;
        create(&router, CHAT, "01.02.2026 09:00 Coffee").await;
        let id = db.get_active_reminders(CHAT).await.unwrap()[0].id;

        router.handle_command(OTHER_CHAT, "mallory", Command::Delete).await;
        let reply = router.handle_text(OTHER_CHAT, "mallory", &id.to_string()).await;
        assert_eq!(reply.text, messages::not_found(id));
        assert_eq!(db.get_active_reminders(CHAT).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_repeat_flow() {
        let (db, router) = setup().await;
        create(&router, CHAT, "31.12.2025 23:59 Годовщина").await;
        let id = db.get_active_reminders(CHAT).await.unwrap()[0].id;

        router.handle_command(CHAT, "alice", Command::SetRepeat).await;
        let choose = router.handle_text(CHAT, "alice", &id.to_string()).await;
        assert_eq!(choose.keyboard, Keyboard::RepeatChoice);
        assert_eq!(
            router.conversation_state(CHAT),
            ConversationState::AwaitingRepeatChoice { reminder_id: id }
        );

        let done = router.handle_button(CHAT, "alice", "repeat_monthly").await;
        assert_eq!(done.text, messages::repeat_updated(id, RepeatInterval::Monthly));
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);

        let stored = db.get_reminder(id, CHAT).await.unwrap().unwrap();
        assert_eq!(stored.interval().unwrap(), RepeatInterval::Monthly);
    }

    #[tokio::test]
    async fn test_repeat_none_clears_interval() {
        let (db, router) = setup().await;
        create(&router, CHAT, "01.02.2026 09:00 Coffee").await;
        let id = db.get_active_reminders(CHAT).await.unwrap()[0].id;
        db.set_repeat_interval(id, CHAT, RepeatInterval::Weekly).await.unwrap();

        router.handle_command(CHAT, "alice", Command::SetRepeat).await;
        router.handle_text(CHAT, "alice", &id.to_string()).await;
        let reply = router.handle_button(CHAT, "alice", "repeat_none").await;
        assert_eq!(reply.text, messages::repeat_updated(id, RepeatInterval::None));

        let stored = db.get_reminder(id, CHAT).await.unwrap().unwrap();
        assert_eq!(stored.interval().unwrap(), RepeatInterval::None);
    }

    #[tokio::test]
    async fn test_repeat_target_missing_resets_to_idle() {
        let (_db, router) = setup().await;
        router.handle_command(CHAT, "alice", Command::SetRepeat).await;

        let reply = router.handle_text(CHAT, "alice", "999").await;
        assert_eq!(reply.text, messages::not_found(999));
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_repeat_button_outside_choice_is_wrong_context() {
        let (_db, router) = setup().await;
        let reply = router.handle_button(CHAT, "alice", "repeat_daily").await;
        assert_eq!(reply.text, messages::WRONG_CONTEXT);

        router.handle_command(CHAT, "alice", Command::Delete).await;
        let reply = router.handle_button(CHAT, "alice", "repeat_daily").await;
        assert_eq!(reply.text, messages::WRONG_CONTEXT);
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_free_text_during_repeat_choice_clears_state() {
        let (db, router) = setup().await;
        create(&router, CHAT, "01.02.2026 09:00 Coffee").await;
        let id = db.get_active_reminders(CHAT).await.unwrap()[0].id;

        router.handle_command(CHAT, "alice", Command::SetRepeat).await;
        router.handle_text(CHAT, "alice", &id.to_string()).await;
        let reply = router.handle_text(CHAT, "alice", "daily please").await;
        assert_eq!(reply.text, messages::NOT_UNDERSTOOD);
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_repeat_choice_for_deleted_reminder_reports_not_found() {
        let (db, router) = setup().await;
        create(&router, CHAT, "01.02.2026 09:00 Coffee").await;
        let id = db.get_active_reminders(CHAT).await.unwrap()[0].id;

        router.handle_command(CHAT, "alice", Command::SetRepeat).await;
        router.handle_text(CHAT, "alice", &id.to_string()).await;
        db.delete_reminder(id, CHAT).await.unwrap();

        let reply = router.handle_button(CHAT, "alice", "repeat_daily").await;
        assert_eq!(reply.text, messages::not_found(id));
    }

    #[tokio::test]
    async fn test_menu_label_and_button_act_as_commands() {
        let (_db, router) = setup().await;

        router.handle_text(CHAT, "alice", "❌ Удалить напоминание").await;
        assert_eq!(router.conversation_state(CHAT), ConversationState::AwaitingDeleteId);

        // A menu label overrides whatever was pending
        router.handle_text(CHAT, "alice", "Создать напоминание").await;
        assert_eq!(
            router.conversation_state(CHAT),
            ConversationState::AwaitingReminderText
        );

        router.handle_button(CHAT, "alice", "menu_repeat").await;
        assert_eq!(
            router.conversation_state(CHAT),
            ConversationState::AwaitingRepeatTargetId
        );

        let welcome = router.handle_command(CHAT, "alice", Command::Start).await;
        assert_eq!(welcome.text, messages::WELCOME);
        assert_eq!(router.conversation_state(CHAT), ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_double_submit_creates_one_reminder() {
        let (db, router) = setup().await;
        let router = Arc::new(router);
        router.handle_command(CHAT, "alice", Command::Create).await;

        let (first, second) = tokio::join!(
            router.handle_text(CHAT, "alice", "01.02.2026 09:00 Coffee"),
            router.handle_text(CHAT, "alice", "01.02.2026 09:00 Coffee"),
        );

        let created = [&first, &second]
            .iter()
            .filter(|reply| reply.text.contains("Напоминание создано"))
            .count();
        assert_eq!(created, 1);
        assert!([&first, &second]
            .iter()
            .any(|reply| reply.text == messages::NOT_UNDERSTOOD));
        assert_eq!(db.get_active_reminders(CHAT).await.unwrap().len(), 1);
    }
}
