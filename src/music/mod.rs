//! Lavalink-backed music playback.

mod controls;
mod hooks;
mod playback;

pub use controls::{control_rows, step_volume, Control};
pub use playback::{LoopMode, Playback, Requeue};

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context as _, Result};
use lavalink_rs::client::LavalinkClient;
use lavalink_rs::model::events;
use lavalink_rs::model::player::ConnectionInfo;
use lavalink_rs::model::track::TrackData;
use lavalink_rs::node::NodeBuilder;
use lavalink_rs::prelude::{NodeDistributionStrategy, PlayerContext};
use serenity::all::{Cache, ChannelId, Context, CreateEmbed, GuildId, Http, UserId};
use tracing::{info, warn};

use crate::config::LavalinkConfig;
use crate::resources::colors;
use crate::utils::{format_clock, truncate};

/// Per-player data attached when the player is created.
pub struct PlayerData {
    /// Channel receiving "now playing" messages.
    pub text_channel: ChannelId,
    pub http: Arc<Http>,
    playback: Mutex<Playback>,
}

impl PlayerData {
    /// Loop mode and history. Never held across an await.
    pub fn playback(&self) -> MutexGuard<'_, Playback> {
        self.playback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub async fn connect(config: &LavalinkConfig, user_id: UserId) -> LavalinkClient {
    let client_events = events::Events {
        track_start: Some(hooks::track_start),
        track_end: Some(hooks::track_end),
        track_exception: Some(hooks::track_exception),
        ..Default::default()
    };

    let node = NodeBuilder {
        hostname: config.host.clone(),
        is_ssl: config.secure,
        events: events::Events::default(),
        password: config.password.clone(),
        user_id: user_id.into(),
        session_id: None,
    };

    info!("Connecting to Lavalink node {}", config.host);
    LavalinkClient::new(
        client_events,
        vec![node],
        NodeDistributionStrategy::round_robin(),
    )
    .await
}

/// Voice channel `user` is connected to, from the cache.
pub fn voice_channel(cache: &Cache, guild_id: GuildId, user: UserId) -> Option<ChannelId> {
    let guild = cache.guild(guild_id)?;
    guild
        .voice_states
        .get(&user)
        .and_then(|voice_state| voice_state.channel_id)
}

/// Join `channel` and create a player that reports to `text_channel`.
pub async fn join(
    ctx: &Context,
    lavalink: &LavalinkClient,
    guild_id: GuildId,
    channel: ChannelId,
    text_channel: ChannelId,
    volume: u16,
) -> Result<PlayerContext> {
    let manager = songbird::get(ctx)
        .await
        .ok_or_else(|| anyhow!("songbird voice client is not registered"))?;

    let (connection, _call) = manager
        .join_gateway(guild_id, channel)
        .await
        .with_context(|| format!("failed to join voice channel {}", channel))?;
    let connection_info = lavalink_connection(connection);

    let data = Arc::new(PlayerData {
        text_channel,
        http: ctx.http.clone(),
        playback: Mutex::new(Playback::default()),
    });
    let player = lavalink
        .create_player_context_with_data::<PlayerData>(guild_id, connection_info, data)
        .await?;
    player.set_volume(volume).await?;

    info!("Joined voice channel {} in guild {}", channel, guild_id);
    Ok(player)
}

/// songbird and lavalink-rs depend on different songbird versions, so the voice
/// server details are copied field by field.
fn lavalink_connection(connection: songbird::ConnectionInfo) -> ConnectionInfo {
    ConnectionInfo {
        endpoint: connection.endpoint,
        token: connection.token,
        session_id: connection.session_id,
    }
}

/// Destroy the guild's player and leave voice.
pub async fn leave(ctx: &Context, lavalink: &LavalinkClient, guild_id: GuildId) -> Result<()> {
    lavalink.delete_player(guild_id).await?;

    if let Some(manager) = songbird::get(ctx).await {
        if manager.get(guild_id).is_some() {
            if let Err(e) = manager.remove(guild_id).await {
                warn!("Failed to leave voice in guild {}: {}", guild_id, e);
            }
        }
    }

    Ok(())
}

/// Lavalink identifier for user input: URLs pass through, plain text becomes a search.
pub fn search_query(input: &str, search_prefix: &str) -> String {
    let input = input.trim();
    if input.starts_with("https://") || input.starts_with("http://") {
        input.to_string()
    } else {
        format!("{}:{}", search_prefix, input)
    }
}

/// Requester id stored in a track's user data.
pub fn requester(track: &TrackData) -> Option<UserId> {
    track
        .user_data
        .as_ref()?
        .get("requester_id")?
        .as_u64()
        .filter(|id| *id != 0)
        .map(UserId::new)
}

pub fn with_requester(mut track: TrackData, user: UserId) -> TrackData {
    track.user_data = Some(serde_json::json!({ "requester_id": user.get() }));
    track
}

/// Markdown link to the track, or its bare title.
pub fn track_title(track: &TrackData) -> String {
    let title = truncate(&track.info.title, 60);
    match &track.info.uri {
        Some(uri) => format!("[{}]({})", title, uri),
        None => title,
    }
}

pub fn track_length(track: &TrackData) -> String {
    if track.info.is_stream {
        "LIVE".to_string()
    } else {
        format_clock(track.info.length)
    }
}

pub fn now_playing_embed(track: &TrackData) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .colour(colors::MAIN)
        .title("Now playing")
        .description(track_title(track))
        .field("Author", &track.info.author, true)
        .field("Duration", track_length(track), true);

    if let Some(user) = requester(track) {
        embed = embed.field("Requested by", format!("<@{}>", user), true);
    }
    if let Some(artwork) = &track.info.artwork_url {
        embed = embed.thumbnail(artwork);
    }
    embed
}
