//! /stop command - clear the queue and leave voice.

use anyhow::{Context as _, Result};
use serenity::all::Context;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::music;
use crate::state::Data;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("stop", "Stop playback, clear the queue and leave"),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                ..PlayerRequirements::default()
            },
            aliases: &["end"],
            usage: "stop",
            examples: &["{prefix}stop", "/stop"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("stop used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to stop")?;

    player.get_queue().clear()?;
    player.stop_now().await?;
    music::leave(ctx, &data.lavalink, guild_id).await?;

    inv.reply(
        &ctx.http,
        CommandReply::success("Stopped playback and left the voice channel."),
    )
    .await
}
