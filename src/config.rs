//! Configuration management for the bot.

use anyhow::{bail, Context, Result};
use serenity::all::{ChannelId, GuildId, UserId};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::resources::LOCALES;

/// How application commands are pushed to Discord on start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Diff against the registered commands and only touch what changed.
    Development,
    /// Bulk-overwrite every scope.
    Production,
}

/// Lavalink node settings.
#[derive(Debug, Clone)]
pub struct LavalinkConfig {
    pub host: String,
    pub password: String,
    pub secure: bool,
    /// Lavalink search prefix for plain-text queries (e.g. `ytmsearch`).
    pub search_prefix: String,
    pub default_volume: u16,
    pub max_volume: u16,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,

    /// Guild owning the guild-scoped slash commands
    pub guild_id: GuildId,

    /// Users allowed to run developer commands and bypass cooldowns
    pub dev_ids: Vec<UserId>,

    pub default_prefix: String,
    pub default_locale: String,
    pub mode: Mode,

    /// Scope for commands that don't declare one
    pub global_commands: bool,

    pub default_cooldown: Duration,
    pub sync_timeout: Duration,

    pub mongo_uri: String,
    pub mongo_database: String,

    pub lavalink: LavalinkConfig,

    /// Channels receiving guild join/leave logs
    pub join_log_channel: Option<ChannelId>,
    pub leave_log_channel: Option<ChannelId>,

    pub support_server: Option<String>,
    pub github_repo: Option<String>,
    pub website: Option<String>,

    /// Log level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = var("DISCORD_TOKEN").context("DISCORD_TOKEN environment variable not set")?;

        let guild_id = var("GUILD_ID")
            .context("GUILD_ID environment variable not set")
            .and_then(|raw| parse_id("GUILD_ID", &raw))
            .map(GuildId::new)?;

        let mongo_uri = var("MONGO_URI").context("MONGO_URI environment variable not set")?;

        let dev_ids = match var("DEV_IDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| parse_id("DEV_IDS", id).map(UserId::new))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        if dev_ids.is_empty() {
            warn!("DEV_IDS is empty, developer commands won't be accessible");
        }

        let mut default_locale = var("DEFAULT_LOCALE").unwrap_or_else(|| "en-US".to_string());
        if !LOCALES.iter().any(|locale| locale.code == default_locale) {
            warn!("DEFAULT_LOCALE '{}' is not supported, using en-US", default_locale);
            default_locale = "en-US".to_string();
        }

        let mode = match var("MODE").as_deref() {
            Some("production") => Mode::Production,
            _ => Mode::Development,
        };

        let lavalink = LavalinkConfig {
            host: var("LAVALINK_HOST").unwrap_or_else(|| "localhost:2333".to_string()),
            password: var("LAVALINK_PASSWORD").unwrap_or_else(|| "youshallnotpass".to_string()),
            secure: parse_or("LAVALINK_SECURE", var("LAVALINK_SECURE"), false)?,
            search_prefix: var("SEARCH_PREFIX").unwrap_or_else(|| "ytmsearch".to_string()),
            default_volume: parse_or("DEFAULT_VOLUME", var("DEFAULT_VOLUME"), 50)?,
            max_volume: parse_or("MAX_VOLUME", var("MAX_VOLUME"), 200)?,
        };
        if lavalink.default_volume > lavalink.max_volume {
            bail!(
                "DEFAULT_VOLUME ({}) cannot exceed MAX_VOLUME ({})",
                lavalink.default_volume,
                lavalink.max_volume
            );
        }

        let channel = |key: &str| -> Result<Option<ChannelId>> {
            var(key)
                .map(|raw| parse_id(key, &raw).map(ChannelId::new))
                .transpose()
        };

        Ok(Self {
            discord_token,
            guild_id,
            dev_ids,
            default_prefix: var("DEFAULT_PREFIX").unwrap_or_else(|| "!".to_string()),
            default_locale,
            mode,
            global_commands: parse_or("GLOBAL_COMMANDS", var("GLOBAL_COMMANDS"), false)?,
            default_cooldown: Duration::from_secs(parse_or(
                "DEFAULT_COOLDOWN",
                var("DEFAULT_COOLDOWN"),
                5,
            )?),
            sync_timeout: Duration::from_secs(parse_or(
                "SYNC_TIMEOUT_SECS",
                var("SYNC_TIMEOUT_SECS"),
                10,
            )?),
            mongo_uri,
            mongo_database: var("MONGO_DATABASE").unwrap_or_else(|| "hopeless".to_string()),
            lavalink,
            join_log_channel: channel("CHANNEL_JOIN")?,
            leave_log_channel: channel("CHANNEL_LEAVE")?,
            support_server: var("SUPPORT_SERVER"),
            github_repo: var("GITHUB_REPO"),
            website: var("BOT_WEBSITE"),
            log_level: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn is_dev(&self, user_id: UserId) -> bool {
        self.dev_ids.contains(&user_id)
    }
}

/// Discord ids are non-zero snowflakes.
fn parse_id(key: &str, raw: &str) -> Result<u64> {
    let id: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a Discord id, got '{}'", key, raw))?;
    if id == 0 {
        bail!("{} cannot be 0", key);
    }
    Ok(id)
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}
