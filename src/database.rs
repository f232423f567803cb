//! # Reminder Store
//!
//! SQLite persistence for reminders. A single connection sits behind an async
//! mutex so the scheduler and the command flows never interleave writes, and
//! every mutation runs in autocommit mode: when a method returns `Ok`, the
//! change is on disk.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::NaiveDateTime;
use log::{debug, info};
use sqlite::{Connection, State, Statement};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::clock::{from_storage, to_storage};
use crate::core::error::{ReminderError, Result};
use crate::features::reminders::{ChatId, Reminder, RepeatInterval};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS reminders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id INTEGER NOT NULL,
        owner_label TEXT NOT NULL,
        text TEXT NOT NULL,
        created_time TEXT NOT NULL,
        next_time TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        repeat_interval TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_reminders_chat_id ON reminders(chat_id);
    CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders(is_active, next_time);
";

const REMINDER_COLUMNS: &str =
    "id, chat_id, owner_label, text, created_time, next_time, is_active, repeat_interval";

#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema exists
    ///
    /// `":memory:"` gives a private in-memory database.
    pub async fn new(path: &str) -> Result<Self> {
        let connection = sqlite::open(path)?;
        connection.execute("PRAGMA busy_timeout = 30000;")?;
        connection.execute(SCHEMA)?;
        info!("Reminder database ready at {path}");

        Ok(Database {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Store a new active reminder and return its id
    ///
    /// Past trigger times are accepted; they fire on the next poll.
    pub async fn add_reminder(
        &self,
        chat_id: ChatId,
        owner_label: &str,
        text: &str,
        trigger_time: NaiveDateTime,
    ) -> Result<i64> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ReminderError::Validation(
                "reminder text must not be empty".to_string(),
            ));
        }
        let time = to_storage(&trigger_time);

        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT INTO reminders (chat_id, owner_label, text, created_time, next_time, is_active)
             VALUES (?, ?, ?, ?, ?, 1)",
        )?;
        statement.bind((1, chat_id))?;
        statement.bind((2, owner_label))?;
        statement.bind((3, text))?;
        statement.bind((4, time.as_str()))?;
        statement.bind((5, time.as_str()))?;
        statement.next()?;

        let mut rowid = conn.prepare("SELECT last_insert_rowid()")?;
        rowid.next()?;
        let id = rowid.read::<i64, _>(0)?;

        debug!("Inserted reminder #{id} for chat {chat_id} at {time}");
        Ok(id)
    }

    /// Active reminders of one chat, soonest first
    pub async fn get_active_reminders(&self, chat_id: ChatId) -> Result<Vec<Reminder>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE chat_id = ? AND is_active = 1
             ORDER BY next_time, id"
        ))?;
        statement.bind((1, chat_id))?;
        collect_reminders(&mut statement)
    }

    /// Look up a reminder by id, only if it belongs to `chat_id`
    pub async fn get_reminder(&self, id: i64, chat_id: ChatId) -> Result<Option<Reminder>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = ? AND chat_id = ?"
        ))?;
        statement.bind((1, id))?;
        statement.bind((2, chat_id))?;
        Ok(collect_reminders(&mut statement)?.into_iter().next())
    }

    /// Remove a reminder; false when no row matched both id and chat
    pub async fn delete_reminder(&self, id: i64, chat_id: ChatId) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare("DELETE FROM reminders WHERE id = ? AND chat_id = ?")?;
        statement.bind((1, id))?;
        statement.bind((2, chat_id))?;
        statement.next()?;
        drop(statement);

        Ok(conn.change_count() > 0)
    }

    /// Change the repeat interval; false when no row matched both id and chat
    pub async fn set_repeat_interval(
        &self,
        id: i64,
        chat_id: ChatId,
        interval: RepeatInterval,
    ) -> Result<bool> {
        let conn = self.connection.lock().await;
        let mut statement =
            conn.prepare("UPDATE reminders SET repeat_interval = ? WHERE id = ? AND chat_id = ?")?;
        statement.bind((1, interval.as_db_value()))?;
        statement.bind((2, id))?;
        statement.bind((3, chat_id))?;
        statement.next()?;
        drop(statement);

        Ok(conn.change_count() > 0)
    }

    /// Active reminders whose next time is at or before `threshold`
    pub async fn get_due_reminders(&self, threshold: NaiveDateTime) -> Result<Vec<Reminder>> {
        let threshold = to_storage(&threshold);

        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders
             WHERE is_active = 1 AND next_time <= ?
             ORDER BY next_time, id"
        ))?;
        statement.bind((1, threshold.as_str()))?;
        collect_reminders(&mut statement)
    }

    /// Deactivate a delivered one-shot reminder
    ///
    /// Only applies while the row is still the active one-shot that was due at
    /// `due_time`; returns false when it changed in between.
    pub async fn deactivate_reminder(&self, id: i64, due_time: NaiveDateTime) -> Result<bool> {
        let due_time = to_storage(&due_time);

        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "UPDATE reminders SET is_active = 0
             WHERE id = ? AND is_active = 1 AND next_time = ? AND repeat_interval IS NULL",
        )?;
        statement.bind((1, id))?;
        statement.bind((2, due_time.as_str()))?;
        statement.next()?;
        drop(statement);

        Ok(conn.change_count() > 0)
    }

    /// Move a delivered repeating reminder from `due_time` to `next_time`
    ///
    /// Only applies while the row is still active, still due at `due_time` and
    /// still repeats at `interval`; returns false otherwise.
    pub async fn advance_reminder(
        &self,
        id: i64,
        due_time: NaiveDateTime,
        interval: RepeatInterval,
        next_time: NaiveDateTime,
    ) -> Result<bool> {
        let due_time = to_storage(&due_time);
        let next_time = to_storage(&next_time);

        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "UPDATE reminders SET next_time = ?
             WHERE id = ? AND is_active = 1 AND next_time = ? AND repeat_interval = ?",
        )?;
        statement.bind((1, next_time.as_str()))?;
        statement.bind((2, id))?;
        statement.bind((3, due_time.as_str()))?;
        statement.bind((4, interval.as_db_value()))?;
        statement.next()?;
        drop(statement);

        Ok(conn.change_count() > 0)
    }

    /// Run raw SQL against the store
    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &str) -> Result<()> {
        self.connection.lock().await.execute(sql)?;
        Ok(())
    }

    /// Write an arbitrary interval value, bypassing `RepeatInterval`
    #[cfg(test)]
    pub(crate) async fn set_raw_repeat_interval(&self, id: i64, raw: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare("UPDATE reminders SET repeat_interval = ? WHERE id = ?")?;
        statement.bind((1, raw))?;
        statement.bind((2, id))?;
        statement.next()?;
        Ok(())
    }
}

fn collect_reminders(statement: &mut Statement<'_>) -> Result<Vec<Reminder>> {
    let mut reminders = Vec::new();
    while let State::Row = statement.next()? {
        reminders.push(read_reminder(statement)?);
    }
    Ok(reminders)
}

fn read_reminder(statement: &Statement<'_>) -> Result<Reminder> {
    let created_time = statement.read::<String, _>("created_time")?;
    let next_time = statement.read::<String, _>("next_time")?;

    Ok(Reminder {
        id: statement.read::<i64, _>("id")?,
        chat_id: statement.read::<i64, _>("chat_id")?,
        owner_label: statement.read::<String, _>("owner_label")?,
        text: statement.read::<String, _>("text")?,
        created_time: from_storage(&created_time)?,
        next_time: from_storage(&next_time)?,
        is_active: statement.read::<i64, _>("is_active")? != 0,
        repeat_interval: statement.read::<Option<String>, _>("repeat_interval")?,
    })
}
