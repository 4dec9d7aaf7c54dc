//! Discord music bot with per-guild settings and self-synchronizing application commands.

mod commands;
mod config;
mod cooldown;
mod database;
mod handlers;
mod music;
mod resources;
mod state;
mod sync;
mod utils;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context as _, Result};
use serenity::all::{Client, GatewayIntents, Http};
use songbird::SerenityInit;
use tracing::info;

use commands::{CommandRegistry, RegistryDefaults};
use config::{Config, Mode};
use cooldown::CooldownTracker;
use database::GuildStore;
use handlers::Handler;
use state::Data;
use sync::{SerenityPlatform, SyncStrategy, Synchronizer};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting {} v{} ({:?})", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), config.mode);

    let http = Arc::new(Http::new(&config.discord_token));
    let application = http
        .get_current_application_info()
        .await
        .context("failed to fetch application info, is DISCORD_TOKEN valid?")?;
    http.set_application_id(application.id);
    let bot_user = http.get_current_user().await?;
    info!("Authenticated as {} ({})", bot_user.name, bot_user.id);

    let db = database::connect(&config.mongo_uri, &config.mongo_database)
        .await
        .context("failed to connect to MongoDB")?;
    let guilds = GuildStore::new(&db, &config.default_prefix, &config.default_locale);

    let lavalink = music::connect(&config.lavalink, bot_user.id).await;

    let registry = CommandRegistry::new(
        commands::declarations(&config),
        RegistryDefaults {
            global: config.global_commands,
            cooldown: config.default_cooldown,
        },
    )?;
    info!("Loaded {} commands", registry.iter().count());

    let strategy = match config.mode {
        Mode::Production => SyncStrategy::Overwrite,
        Mode::Development => SyncStrategy::Reconcile,
    };
    let synchronizer = Synchronizer::new(
        SerenityPlatform::new(http.clone()),
        config.guild_id,
        strategy,
        config.sync_timeout,
    );

    let token = config.discord_token.clone();
    let data = Arc::new(Data {
        config,
        registry,
        cooldowns: CooldownTracker::default(),
        guilds,
        lavalink,
        synchronizer,
        started_at: Instant::now(),
    });

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_VOICE_STATES;
    let mut client = Client::builder(&token, intents)
        .event_handler(Handler::new(data))
        .register_songbird()
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            shard_manager.shutdown_all().await;
        }
    });

    // Run the bot
    info!("Connecting to Discord...");
    client.start().await?;

    Ok(())
}
