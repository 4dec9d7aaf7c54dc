//! /pause command - toggles between paused and playing.

use anyhow::{Context as _, Result};
use serenity::all::Context;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::resources::emojis;
use crate::state::Data;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("pause", "Pause or resume the current track"),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                playing: true,
            },
            aliases: &["resume", "toggle"],
            usage: "pause",
            examples: &["{prefix}pause", "/pause"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("pause used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to pause")?;

    let paused = !player.get_player().await?.paused;
    player.set_pause(paused).await?;

    let description = if paused {
        format!("{} Paused.", emojis::PAUSE)
    } else {
        format!("{} Resumed.", emojis::PLAY)
    };
    inv.reply(&ctx.http, CommandReply::success(description)).await
}
