//! Environment-driven configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;
use std::time::Duration;

pub const DEFAULT_DATABASE_PATH: &str = "reminders.db";
pub const DEFAULT_TIMEZONE: &str = "Europe/Moscow";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_FAILURE_BACKOFF_SECS: u64 = 60;
pub const DEFAULT_DELIVERY_PAUSE_SECS: u64 = 5;

/// Timing for the reminder scheduler loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Sleep between successful polls
    pub poll_interval: Duration,
    /// Sleep after a poll that failed as a whole
    pub failure_backoff: Duration,
    /// Pause after a single failed delivery before moving to the next reminder
    pub delivery_failure_pause: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            failure_backoff: Duration::from_secs(DEFAULT_FAILURE_BACKOFF_SECS),
            delivery_failure_pause: Duration::from_secs(DEFAULT_DELIVERY_PAUSE_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub discord_guild_id: Option<String>,
    pub database_path: String,
    pub timezone: Tz,
    pub scheduler: SchedulerConfig,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .context("DISCORD_TOKEN must be set")?;

        let timezone_name =
            lookup("REMINDER_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid REMINDER_TIMEZONE '{}': {}", timezone_name, e))?;

        let scheduler = SchedulerConfig {
            poll_interval: seconds(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?,
            failure_backoff: seconds(
                &lookup,
                "POLL_FAILURE_BACKOFF_SECS",
                DEFAULT_FAILURE_BACKOFF_SECS,
            )?,
            delivery_failure_pause: seconds(
                &lookup,
                "DELIVERY_FAILURE_PAUSE_SECS",
                DEFAULT_DELIVERY_PAUSE_SECS,
            )?,
        };

        Ok(Config {
            discord_token,
            discord_guild_id: lookup("DISCORD_GUILD_ID").filter(|id| !id.trim().is_empty()),
            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            timezone,
            scheduler,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a whole number of seconds, got '{raw}'"))?;
            Ok(Duration::from_secs(secs))
        }
        None => Ok(Duration::from_secs(default)),
    }
}
