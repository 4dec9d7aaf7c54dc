//! Gateway event handling.

mod autocomplete;
mod button;
mod checks;
mod guild;
mod prefix;
mod slash;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serenity::all::{
    ActivityData, Context, EventHandler, Guild, GuildId, Interaction, Message, OnlineStatus, Ready,
    UnavailableGuild,
};
use serenity::async_trait;
use tracing::{debug, error, info, warn};

use crate::database::GuildSettings;
use crate::state::Data;

/// Time between presence changes.
const PRESENCE_INTERVAL: Duration = Duration::from_secs(300);

pub struct Handler {
    data: Arc<Data>,
    /// Set once the first `ready` has run startup work. Reconnects fire `ready` again.
    started: AtomicBool,
}

impl Handler {
    pub fn new(data: Arc<Data>) -> Self {
        Self {
            data,
            started: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Bot connected as {} in {} guilds",
            ready.user.name,
            ready.guilds.len()
        );
        ctx.set_presence(Some(ActivityData::listening("/help")), OnlineStatus::Online);

        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }

        tokio::spawn(rotate_presence(ctx.clone()));

        let local = self.data.registry.local_commands();
        match self.data.synchronizer.run(&local).await {
            Ok(report) if report.mutations() == 0 => debug!("Application commands already up to date"),
            Ok(_) => {}
            Err(e) => error!("Command synchronization failed: {}", e),
        }
    }

    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        info!("Cache ready with {} guilds", guilds.len());
        guild::backfill(&ctx, &self.data, &guilds).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => slash::handle(&ctx, &self.data, &command).await,
            Interaction::Autocomplete(command) => {
                autocomplete::handle(&ctx, &self.data, &command).await
            }
            Interaction::Component(component) => {
                button::handle(&ctx, &self.data, &component).await
            }
            _ => {}
        }
    }

    async fn message(&self, ctx: Context, message: Message) {
        prefix::handle(&ctx, &self.data, &message).await;
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new == Some(true) {
            guild::joined(&ctx, &self.data, &guild).await;
        }
    }

    async fn guild_delete(&self, ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        // Outages also delete guilds, flagged unavailable.
        if incomplete.unavailable {
            warn!("Guild {} became unavailable", incomplete.id);
            return;
        }
        guild::left(&ctx, &self.data, incomplete.id, full.as_ref()).await;
    }
}

async fn rotate_presence(ctx: Context) {
    let mut interval = tokio::time::interval(PRESENCE_INTERVAL);
    let mut turn = 0usize;

    loop {
        interval.tick().await;

        let activity = match turn % 4 {
            0 => ActivityData::listening("/help"),
            1 => ActivityData::watching(format!("{} servers", ctx.cache.guild_count())),
            2 => ActivityData::listening(format!("{} users", member_count(&ctx))),
            _ => ActivityData::playing("music with slash commands"),
        };
        ctx.set_activity(Some(activity));
        turn = turn.wrapping_add(1);
    }
}

fn member_count(ctx: &Context) -> u64 {
    ctx.cache
        .guilds()
        .into_iter()
        .filter_map(|id| ctx.cache.guild(id).map(|guild| guild.member_count))
        .sum()
}

/// Settings of the guild an event happened in, created on first use.
///
/// Storage failures are logged and treated as "no settings", so commands keep
/// working with the configured defaults.
async fn guild_settings(ctx: &Context, data: &Data, guild_id: Option<GuildId>) -> Option<GuildSettings> {
    let guild_id = guild_id?;
    let fresh = ctx
        .cache
        .guild(guild_id)
        .map(|guild| data.guilds.settings_for(&guild));

    let result = match fresh {
        Some(fresh) => data.guilds.get_or_create(fresh).await.map(Some),
        None => data.guilds.get(guild_id).await,
    };

    match result {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to load settings of guild {}: {}", guild_id, e);
            None
        }
    }
}

/// Prefix and locale in effect for a guild.
fn prefix_and_locale(data: &Data, settings: Option<&GuildSettings>) -> (String, String) {
    let config = &data.config;
    match settings {
        Some(settings) => (
            settings.prefix_or(&config.default_prefix).to_string(),
            settings.locale_or(&config.default_locale).to_string(),
        ),
        None => (config.default_prefix.clone(), config.default_locale.clone()),
    }
}
