//! Lavalink event hooks.

use lavalink_rs::client::LavalinkClient;
use lavalink_rs::hook;
use lavalink_rs::model::events::{TrackEnd, TrackException, TrackStart};
use lavalink_rs::prelude::TrackInQueue;
use serenity::all::{CreateEmbed, CreateMessage, GuildId};
use tracing::{debug, error, warn};

use super::{control_rows, now_playing_embed, track_title, PlayerData, Requeue};
use crate::resources::colors;

/// Post the "now playing" embed with player controls.
#[hook]
pub async fn track_start(client: LavalinkClient, _session_id: String, event: &TrackStart) {
    let guild_id = GuildId::new(event.guild_id.0);
    debug!("Track started in guild {}: {}", guild_id, event.track.info.title);

    let Some(player) = client.get_player_context(event.guild_id) else {
        return;
    };
    let data = match player.data::<PlayerData>() {
        Ok(data) => data,
        Err(e) => {
            warn!("Player in guild {} has no data: {}", guild_id, e);
            return;
        }
    };

    let message = CreateMessage::new()
        .embed(now_playing_embed(&event.track))
        .components(control_rows(false));
    if let Err(e) = data.text_channel.send_message(&data.http, message).await {
        error!("Failed to announce track in guild {}: {}", guild_id, e);
    }
}

/// Remember the track for the previous-track control and put it back when looping.
#[hook]
pub async fn track_end(client: LavalinkClient, _session_id: String, event: &TrackEnd) {
    let guild_id = GuildId::new(event.guild_id.0);
    let Some(player) = client.get_player_context(event.guild_id) else {
        return;
    };
    let Ok(data) = player.data::<PlayerData>() else {
        return;
    };

    let requeue = data.playback().ended(&event.track, &event.reason);
    let Some(requeue) = requeue else {
        return;
    };

    debug!("Looping {} in guild {} ({:?})", event.track.info.title, guild_id, requeue);
    let track = TrackInQueue::from(event.track.clone());
    let queue = player.get_queue();
    let result = match requeue {
        Requeue::Front => queue.push_to_front(track),
        Requeue::Back => queue.push_to_back(track),
    };
    if let Err(e) = result {
        warn!("Failed to requeue track in guild {}: {}", guild_id, e);
        return;
    }

    // The player went idle if the queue was empty when the track ended.
    if matches!(player.get_player().await, Ok(state) if state.track.is_none()) {
        if let Err(e) = player.skip() {
            warn!("Failed to restart looping player in guild {}: {}", guild_id, e);
        }
    }
}

#[hook]
pub async fn track_exception(client: LavalinkClient, _session_id: String, event: &TrackException) {
    let guild_id = GuildId::new(event.guild_id.0);
    warn!(
        "Track {} failed in guild {}: {:?}",
        event.track.info.title, guild_id, event.exception
    );

    let Some(player) = client.get_player_context(event.guild_id) else {
        return;
    };
    let Ok(data) = player.data::<PlayerData>() else {
        return;
    };

    let embed = CreateEmbed::new()
        .colour(colors::ERROR)
        .description(format!("Could not play {}", track_title(&event.track)));
    if let Err(e) = data
        .text_channel
        .send_message(&data.http, CreateMessage::new().embed(embed))
        .await
    {
        error!("Failed to report track error in guild {}: {}", guild_id, e);
    }
}
