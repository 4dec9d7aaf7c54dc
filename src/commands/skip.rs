//! /skip command.

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
        definition: guild_command("skip", "Skip the current track"),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                playing: true,
            },
            aliases: &["s", "next"],
            usage: "skip",
            examples: &["{prefix}skip", "/skip"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("skip used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to skip on")?;

    let skipped = player.get_player().await?.track;
    player.skip()?;

    let description = match skipped {
        Some(track) => format!("Skipped {}", music::track_title(&track)),
        None => "Skipped.".to_string(),
    };
    inv.reply(&ctx.http, CommandReply::success(description)).await
}
