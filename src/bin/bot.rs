use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;

use deadline_reminder_bot::commands::{
    register_global_commands, register_guild_commands, CommandContext, CommandHandler,
};
use deadline_reminder_bot::core::{Config, StorageBackend};
use deadline_reminder_bot::features::reminders::{
    HttpMessageSender, KeyValueStore, MemoryStorage, ReminderScheduler, ReminderStore,
    SqliteStorage,
};

struct Handler {
    command_handler: Arc<CommandHandler>,
    guild_id: Option<GuildId>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());

        // Register slash commands - use guild commands for development (instant), global for production
        if let Some(guild_id) = self.guild_id {
            info!("🔧 Development mode: Registering commands for guild {guild_id}");
            if let Err(e) = register_guild_commands(&ctx, guild_id).await {
                error!("❌ Failed to register guild slash commands: {e}");
            }
        } else {
            info!("🌍 Production mode: Registering commands globally");
            if let Err(e) = register_global_commands(&ctx).await {
                error!("❌ Failed to register global slash commands: {e}");
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::ApplicationCommand(command) = interaction {
            if let Err(e) = self
                .command_handler
                .handle_slash_command(&ctx, &command)
                .await
            {
                error!(
                    "Error responding to slash command '{}': {}",
                    command.data.name, e
                );
            }
        }
    }
}

fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let storage: Arc<dyn KeyValueStore> = match config.storage_backend {
        StorageBackend::Sqlite => Arc::new(SqliteStorage::open(&config.database_path)?),
        StorageBackend::Memory => {
            info!("Using in-memory reminder storage; reminders are lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };
    Ok(storage)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting reminder bot...");

    let store = ReminderStore::new(open_storage(&config)?);
    let command_handler = CommandHandler::new(CommandContext::new(store.clone()));

    // Guild ID, if provided, selects development-mode registration
    let guild_id = config.discord_guild_id.map(GuildId);

    let handler = Handler {
        command_handler: Arc::new(command_handler),
        guild_id,
    };

    let intents = GatewayIntents::GUILDS;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    // Start the reminder scheduler
    let scheduler = ReminderScheduler::new(store, config.sweep_interval);
    let sender = Arc::new(HttpMessageSender::new(client.cache_and_http.http.clone()));
    tokio::spawn(async move {
        scheduler.run(sender).await;
    });

    info!("Establishing WebSocket connection to Discord gateway...");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
