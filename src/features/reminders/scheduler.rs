//! Due-reminder polling loop
//!
//! Polls the store on a fixed cadence, delivers due reminders one at a time
//! and then advances (repeating) or deactivates (one-shot) each delivered
//! reminder. A reminder whose delivery failed is left exactly as it was, so
//! the next poll finds it due again.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::time::sleep;

use super::model::{Reminder, RepeatInterval};
use super::notifier::Notifier;
use super::recurrence::next_occurrence;
use crate::core::clock::{to_storage, Clock};
use crate::core::config::SchedulerConfig;
use crate::core::error::{ReminderError, Result};
use crate::database::Database;

/// Conditional settle writes tried before giving up on a reminder
const SETTLE_ATTEMPTS: usize = 3;

/// Text delivered to the chat when a reminder fires
pub fn format_delivery(text: &str) -> String {
    format!("🔔 Напоминание: {text}")
}

/// Outcome counts of a single poll
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub due: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
    /// Delivered but the advance/deactivate write failed; will be redelivered
    pub failed_updates: usize,
    /// Not delivered because the stored repeat interval is unrecognized
    pub invalid_intervals: usize,
}

pub struct ReminderScheduler {
    database: Database,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
    config: SchedulerConfig,
}

impl ReminderScheduler {
    pub fn new(
        database: Database,
        notifier: Arc<dyn Notifier>,
        clock: Clock,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            database,
            notifier,
            clock,
            config,
        }
    }

    /// Run forever; a failed poll backs off instead of ending the loop
    pub async fn run(self) {
        info!(
            "⏰ Reminder scheduler started (every {:?}, timezone {})",
            self.config.poll_interval,
            self.clock.timezone().name()
        );

        loop {
            let now = self.clock.now();
            match self.poll_once(now).await {
                Ok(_) => sleep(self.config.poll_interval).await,
                Err(e) => {
                    error!(
                        "Reminder poll at {} failed: {e}. Retrying in {:?}",
                        to_storage(&now),
                        self.config.failure_backoff
                    );
                    sleep(self.config.failure_backoff).await;
                }
            }
        }
    }

    /// Deliver everything due at `now`
    ///
    /// Only the due query itself can fail the poll; per-reminder problems are
    /// logged and counted in the report.
    pub async fn poll_once(&self, now: NaiveDateTime) -> Result<PollReport> {
        let due = self.database.get_due_reminders(now).await?;
        let mut report = PollReport {
            due: due.len(),
            ..PollReport::default()
        };

        if due.is_empty() {
            debug!("No reminders due at {}", to_storage(&now));
            return Ok(report);
        }
        info!("{} reminder(s) due at {}", due.len(), to_storage(&now));

        for reminder in due {
            let interval = match reminder.interval() {
                Ok(interval) => interval,
                Err(e) => {
                    error!(
                        "[chat {}] Reminder #{} skipped, left due: {e}",
                        reminder.chat_id, reminder.id
                    );
                    report.invalid_intervals += 1;
                    continue;
                }
            };

            if let Err(e) = self
                .notifier
                .send(reminder.chat_id, &format_delivery(&reminder.text))
                .await
            {
                warn!(
                    "[chat {}] Delivery of reminder #{} failed, will retry next poll: {e}",
                    reminder.chat_id, reminder.id
                );
                report.failed_deliveries += 1;
                sleep(self.config.delivery_failure_pause).await;
                continue;
            }

            info!(
                "[chat {}] Sent reminder #{}: {}",
                reminder.chat_id, reminder.id, reminder.text
            );
            report.delivered += 1;

            if let Err(e) = self.settle(&reminder, interval).await {
                error!(
                    "[chat {}] Reminder #{} was delivered but not updated, it will fire again: {e}",
                    reminder.chat_id, reminder.id
                );
                report.failed_updates += 1;
            }
        }

        Ok(report)
    }

    /// Persist the effect of a successful delivery
    ///
    /// Writes are conditional on the row still being what was delivered. If a
    /// command changed it while the message was in flight, the current row is
    /// re-read and settled by its current interval instead.
    async fn settle(&self, delivered: &Reminder, interval: RepeatInterval) -> Result<()> {
        let mut interval = interval;

        for _ in 0..SETTLE_ATTEMPTS {
            let applied = if interval.is_repeating() {
                let next = next_occurrence(delivered.next_time, interval)?;
                let applied = self
                    .database
                    .advance_reminder(delivered.id, delivered.next_time, interval, next)
                    .await?;
                if applied {
                    debug!(
                        "Reminder #{} repeats {interval}, next at {}",
                        delivered.id,
                        to_storage(&next)
                    );
                }
                applied
            } else {
                self.database
                    .deactivate_reminder(delivered.id, delivered.next_time)
                    .await?
            };
            if applied {
                return Ok(());
            }

            let current = self
                .database
                .get_reminder(delivered.id, delivered.chat_id)
                .await?;
            match current {
                Some(current) if current.is_active && current.next_time == delivered.next_time => {
                    interval = current.interval()?;
                    info!(
                        "[chat {}] Reminder #{} changed during delivery, settling as {interval}",
                        delivered.chat_id, delivered.id
                    );
                }
                _ => {
                    debug!(
                        "[chat {}] Reminder #{} was deleted or rescheduled during delivery",
                        delivered.chat_id, delivered.id
                    );
                    return Ok(());
                }
            }
        }

        Err(ReminderError::Conflict(delivered.id))
    }
}
