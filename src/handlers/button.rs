//! Player control buttons.

use anyhow::{anyhow, Result};
use lavalink_rs::prelude::TrackInQueue;
use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
    GuildId, UserId,
};
use tracing::{info, warn};

use super::checks;
use crate::commands::CommandReply;
use crate::music::{self, control_rows, step_volume, Control, PlayerData};
use crate::state::Data;

/// Outcome of a button press.
enum Pressed {
    /// Pause state changed; the controls are redrawn.
    Toggled { paused: bool },
    Done(String),
}

pub async fn handle(ctx: &Context, data: &Data, component: &ComponentInteraction) {
    let Some(control) = Control::from_custom_id(&component.data.custom_id) else {
        return;
    };
    let Some(guild_id) = component.guild_id else {
        return;
    };

    let response = match press(ctx, data, guild_id, component.user.id, control).await {
        Ok(Pressed::Toggled { paused }) => CreateInteractionResponse::UpdateMessage(
            CreateInteractionResponseMessage::new().components(control_rows(paused)),
        ),
        Ok(Pressed::Done(text)) => ephemeral(CommandReply::success(text)),
        Err(e) => ephemeral(CommandReply::error(e.to_string())),
    };

    if let Err(e) = component.create_response(&ctx.http, response).await {
        warn!("Failed to answer player button in guild {}: {}", guild_id, e);
    }
}

fn ephemeral(reply: CommandReply) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .embed(reply.embed)
            .ephemeral(true),
    )
}

async fn press(
    ctx: &Context,
    data: &Data,
    guild_id: GuildId,
    user: UserId,
    control: Control,
) -> Result<Pressed> {
    let bot = ctx.cache.current_user().id;
    let bot_channel = music::voice_channel(&ctx.cache, guild_id, bot);
    if bot_channel.is_none() {
        return Err(anyhow!("{}", checks::Refusal::NoPlayer));
    }
    checks::voice(music::voice_channel(&ctx.cache, guild_id, user), bot_channel)
        .map_err(|refusal| anyhow!("{}", refusal))?;

    let player = data
        .lavalink
        .get_player_context(guild_id)
        .ok_or_else(|| anyhow!("{}", checks::Refusal::NoPlayer))?;
    let state = player.get_player().await?;

    info!("Player button {:?} pressed by {} in guild {}", control, user, guild_id);

    match control {
        Control::Previous => {
            let current = state
                .track
                .ok_or_else(|| anyhow!("{}", checks::Refusal::NothingPlaying))?;
            let player_data = player.data::<PlayerData>()?;
            let previous = player_data
                .playback()
                .rewind()
                .ok_or_else(|| anyhow!("There is no previous track."))?;

            if let Err(e) = player.play_now(&previous).await {
                player_data.playback().rewind_failed(previous);
                return Err(e.into());
            }
            // The interrupted track plays again afterwards.
            player.get_queue().push_to_front(TrackInQueue::from(current))?;
            Ok(Pressed::Done(format!(
                "<@{}> went back to {}.",
                user,
                music::track_title(&previous)
            )))
        }
        Control::Pause => {
            let paused = !state.paused;
            player.set_pause(paused).await?;
            Ok(Pressed::Toggled { paused })
        }
        Control::Skip => {
            if state.track.is_none() {
                return Err(anyhow!("{}", checks::Refusal::NothingPlaying));
            }
            player.skip()?;
            Ok(Pressed::Done(format!("<@{}> skipped the track.", user)))
        }
        Control::Stop => {
            player.get_queue().clear()?;
            player.stop_now().await?;
            music::leave(ctx, &data.lavalink, guild_id).await?;
            Ok(Pressed::Done(format!("<@{}> stopped the player.", user)))
        }
        Control::VolumeUp | Control::VolumeDown => {
            let volume = step_volume(state.volume, control, data.config.lavalink.max_volume);
            player.set_volume(volume).await?;
            Ok(Pressed::Done(format!("Volume set to **{}%**.", volume)))
        }
    }
}
