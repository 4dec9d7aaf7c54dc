//! Guild join and leave bookkeeping.

use std::collections::HashMap;
use std::time::Duration;

use mongodb::bson::DateTime;
use serenity::all::{
    ChannelId, Context, CreateEmbed, CreateEmbedAuthor, CreateMessage, Guild, GuildId, Timestamp,
};
use tracing::{debug, info, warn};

use crate::database::{GuildSettings, StoreError};
use crate::resources::colors;
use crate::state::Data;

/// Settings of guilds the bot left are kept this long in case it is added back.
const LEFT_GUILD_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub async fn joined(ctx: &Context, data: &Data, guild: &Guild) {
    info!("Joined guild {} ({})", guild.name, guild.id);

    let fresh = data.guilds.settings_for(guild);
    let result = match data.guilds.get(guild.id).await {
        Ok(Some(existing)) if existing.left_at.is_some() => {
            data.guilds.mark_rejoined(guild.id, fresh.joined_at).await
        }
        Ok(Some(_)) => Ok(()),
        Ok(None) => data.guilds.create(fresh).await.map(drop),
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        warn!("Failed to store settings of guild {}: {}", guild.id, e);
    }

    post_log(ctx, data.config.join_log_channel, join_log(guild)).await;
}

pub async fn left(ctx: &Context, data: &Data, guild_id: GuildId, guild: Option<&Guild>) {
    info!("Left guild {}", guild_id);

    match data.guilds.mark_left(guild_id).await {
        Ok(()) => {}
        Err(StoreError::NotFound(_)) => debug!("Guild {} had no settings", guild_id),
        Err(e) => warn!("Failed to mark guild {} as left: {}", guild_id, e),
    }

    post_log(ctx, data.config.leave_log_channel, leave_log(guild_id, guild)).await;
}

/// What the backfill does with one guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backfill {
    Create,
    Restore,
    Prune,
    Keep,
}

/// `present` is whether the bot is currently in the guild.
fn decide(stored: Option<&GuildSettings>, present: bool, now: DateTime, retention: Duration) -> Backfill {
    match (stored, present) {
        (None, true) => Backfill::Create,
        (Some(settings), true) if settings.left_at.is_some() => Backfill::Restore,
        (Some(settings), false) if expired(settings, now, retention) => Backfill::Prune,
        _ => Backfill::Keep,
    }
}

/// Reconcile stored settings with the guilds the bot is in after startup.
///
/// Missing guilds get settings, guilds marked as left but present again are
/// restored, and guilds gone longer than [`LEFT_GUILD_RETENTION`] are forgotten.
pub async fn backfill(ctx: &Context, data: &Data, guild_ids: &[GuildId]) {
    let stored: HashMap<String, GuildSettings> = match data.guilds.fetch_all().await {
        Ok(all) => all.into_iter().map(|settings| (settings.id.clone(), settings)).collect(),
        Err(e) => {
            warn!("Skipping guild settings backfill: {}", e);
            return;
        }
    };
    let now = DateTime::now();

    let mut created = 0;
    let mut restored = 0;
    for guild_id in guild_ids {
        let Some(fresh) = ctx
            .cache
            .guild(*guild_id)
            .map(|guild| data.guilds.settings_for(&guild))
        else {
            continue;
        };

        let result = match decide(stored.get(&fresh.id), true, now, LEFT_GUILD_RETENTION) {
            Backfill::Create => {
                let joined_at = fresh.joined_at;
                match data.guilds.create(fresh).await {
                    Ok(_) => {
                        created += 1;
                        Ok(())
                    }
                    // Stored by `joined` since the collection was read.
                    Err(StoreError::AlreadyExists(_)) => match data.guilds.get(*guild_id).await {
                        Ok(Some(current)) if current.left_at.is_some() => {
                            restored += 1;
                            data.guilds.mark_rejoined(*guild_id, joined_at).await
                        }
                        Ok(_) => Ok(()),
                        Err(e) => Err(e),
                    },
                    Err(e) => Err(e),
                }
            }
            Backfill::Restore => {
                restored += 1;
                data.guilds.mark_rejoined(*guild_id, fresh.joined_at).await
            }
            Backfill::Prune | Backfill::Keep => Ok(()),
        };
        if let Err(e) = result {
            warn!("Failed to backfill settings of guild {}: {}", guild_id, e);
        }
    }

    let mut pruned = 0;
    for settings in stored.values() {
        let Some(guild_id) = parse_guild_id(&settings.id) else {
            continue;
        };
        let present = guild_ids.contains(&guild_id);
        if decide(Some(settings), present, now, LEFT_GUILD_RETENTION) != Backfill::Prune {
            continue;
        }
        match data.guilds.delete(guild_id).await {
            Ok(()) => pruned += 1,
            Err(e) => warn!("Failed to prune settings of guild {}: {}", guild_id, e),
        }
    }

    info!(
        "Guild settings backfilled from {} documents: {} created, {} restored, {} pruned",
        stored.len(),
        created,
        restored,
        pruned
    );
}

/// Whether the guild was left longer than `retention` before `now`.
fn expired(settings: &GuildSettings, now: DateTime, retention: Duration) -> bool {
    let Some(left_at) = settings.left_at else {
        return false;
    };
    let retention = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
    now.timestamp_millis().saturating_sub(left_at.timestamp_millis()) > retention
}

fn parse_guild_id(id: &str) -> Option<GuildId> {
    id.parse::<u64>().ok().filter(|id| *id != 0).map(GuildId::new)
}

fn join_log(guild: &Guild) -> CreateEmbed {
    let mut author = CreateEmbedAuthor::new(&guild.name);
    if let Some(icon) = guild.icon_url() {
        author = author.icon_url(icon);
    }

    CreateEmbed::new()
        .colour(colors::JOIN_LOG)
        .author(author)
        .title("Joined a new server")
        .field("Owner", format!("<@{}>", guild.owner_id), true)
        .field("ID", guild.id.to_string(), true)
        .field("Members", guild.member_count.to_string(), true)
        .field(
            "Created",
            format!("<t:{}:F>", guild.id.created_at().unix_timestamp()),
            true,
        )
        .field(
            "Joined",
            format!("<t:{}:F>", guild.joined_at.unix_timestamp()),
            true,
        )
        .timestamp(Timestamp::now())
}

fn leave_log(guild_id: GuildId, guild: Option<&Guild>) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .colour(colors::LEAVE_LOG)
        .title("Left a server")
        .field("ID", guild_id.to_string(), true)
        .timestamp(Timestamp::now());

    match guild {
        Some(guild) => embed
            .description(&guild.name)
            .field("Owner", format!("<@{}>", guild.owner_id), true)
            .field("Members", guild.member_count.to_string(), true),
        None => embed,
    }
}

async fn post_log(ctx: &Context, channel: Option<ChannelId>, embed: CreateEmbed) {
    let Some(channel) = channel else {
        return;
    };
    if let Err(e) = channel
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await
    {
        warn!("Failed to post to log channel {}: {}", channel, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::all::UserId;

    fn settings(left_at: Option<DateTime>) -> GuildSettings {
        let mut settings = GuildSettings::new(
            GuildId::new(1),
            "Guild",
            UserId::new(2),
            DateTime::from_millis(0),
        );
        settings.left_at = left_at;
        settings
    }

    #[test]
    fn only_long_gone_guilds_expire() {
        let day = 24 * 60 * 60 * 1000;
        let now = DateTime::from_millis(100 * day);
        let retention = Duration::from_secs(30 * 24 * 60 * 60);

        assert!(!expired(&settings(None), now, retention));
        assert!(!expired(&settings(Some(DateTime::from_millis(80 * day))), now, retention));
        assert!(expired(&settings(Some(DateTime::from_millis(60 * day))), now, retention));
    }

    #[test]
    fn backfill_decides_per_guild() {
        let day = 24 * 60 * 60 * 1000;
        let now = DateTime::from_millis(100 * day);
        let retention = Duration::from_secs(30 * 24 * 60 * 60);
        let active = settings(None);
        let recently_left = settings(Some(DateTime::from_millis(90 * day)));
        let long_gone = settings(Some(DateTime::from_millis(10 * day)));

        assert_eq!(decide(None, true, now, retention), Backfill::Create);
        assert_eq!(decide(Some(&active), true, now, retention), Backfill::Keep);
        assert_eq!(decide(Some(&recently_left), true, now, retention), Backfill::Restore);
        assert_eq!(decide(Some(&long_gone), true, now, retention), Backfill::Restore);
        assert_eq!(decide(Some(&long_gone), false, now, retention), Backfill::Prune);
        assert_eq!(decide(Some(&recently_left), false, now, retention), Backfill::Keep);
        assert_eq!(decide(Some(&active), false, now, retention), Backfill::Keep);
    }

    #[test]
    fn guild_ids_parse_from_documents() {
        assert_eq!(parse_guild_id("123"), Some(GuildId::new(123)));
        assert_eq!(parse_guild_id("0"), None);
        assert_eq!(parse_guild_id("abc"), None);
    }
}
