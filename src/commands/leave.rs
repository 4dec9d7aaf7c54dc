//! /leave command - disconnect from voice.

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
        definition: guild_command("leave", "Leave the voice channel"),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                ..PlayerRequirements::default()
            },
            aliases: &["dc", "disconnect"],
            usage: "leave",
            examples: &["{prefix}leave", "/leave"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("leave used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to disconnect")?;

    let queued = player.get_queue().get_queue().await?.len();
    music::leave(ctx, &data.lavalink, guild_id).await?;

    inv.reply(&ctx.http, CommandReply::success(farewell(queued))).await
}

fn farewell(queued: usize) -> String {
    match queued {
        0 => "Left the voice channel.".to_string(),
        1 => "Left the voice channel and dropped 1 queued track.".to_string(),
        n => format!("Left the voice channel and dropped {} queued tracks.", n),
    }
}
