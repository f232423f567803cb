use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;

use reminder_bot::commands::CommandRouter;
use reminder_bot::core::{Clock, Config};
use reminder_bot::database::Database;
use reminder_bot::features::reminders::ReminderScheduler;
use reminder_bot::transport::{DiscordNotifier, Handler};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting reminder bot...");
    info!(
        "🕒 Reminder timezone: {}, database: {}",
        config.timezone.name(),
        config.database_path
    );

    // The store is the only dependency the bot cannot start without
    let database = Database::new(&config.database_path).await.map_err(|e| {
        error!("Failed to open reminder database {}: {e}", config.database_path);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;

    let clock = Clock::new(config.timezone);
    let router = Arc::new(CommandRouter::new(database.clone(), clock));

    // Parse guild ID if provided for development mode
    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    let handler = Handler::new(router, guild_id);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");

    // Start the reminder scheduler
    let notifier = Arc::new(DiscordNotifier::new(client.cache_and_http.http.clone()));
    let scheduler = ReminderScheduler::new(database, notifier, clock, config.scheduler);
    tokio::spawn(scheduler.run());

    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
