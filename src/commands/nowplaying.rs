//! /nowplaying command.

use anyhow::{Context as _, Result};
use serenity::all::Context;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::music;
use crate::state::Data;
use crate::utils::{format_clock, progress_bar};

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("nowplaying", "Show the current track"),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                active: true,
                playing: true,
                ..PlayerRequirements::default()
            },
            aliases: &["np", "current"],
            usage: "nowplaying",
            examples: &["{prefix}np", "/nowplaying"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("nowplaying used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player")?
        .get_player()
        .await?;

    let Some(track) = player.track else {
        return inv
            .reply(&ctx.http, CommandReply::error("Nothing is playing."))
            .await;
    };

    let mut embed = music::now_playing_embed(&track);
    if !track.info.is_stream {
        let position = player.state.position;
        embed = embed.field(
            "Progress",
            format!(
                "{} `{} / {}`",
                progress_bar(position, track.info.length, 15),
                format_clock(position),
                format_clock(track.info.length)
            ),
            false,
        );
    }

    let reply = CommandReply::embed(embed).components(music::control_rows(player.paused));
    inv.reply(&ctx.http, reply).await
}
