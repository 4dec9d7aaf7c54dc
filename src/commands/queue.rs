//! /queue command - upcoming tracks.

use anyhow::{Context as _, Result};
use serenity::all::{Context, CreateEmbed, CreateEmbedFooter};

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::music;
use crate::resources::colors;
use crate::state::Data;
use crate::utils::format_clock;

const SHOWN: usize = 10;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("queue", "Show the upcoming tracks"),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                active: true,
                ..PlayerRequirements::default()
            },
            aliases: &["q"],
            usage: "queue",
            examples: &["{prefix}queue", "/queue"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("queue used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player")?;

    let current = player.get_player().await?.track;
    let upcoming = player.get_queue().get_queue().await?;

    let mut description = match &current {
        Some(track) => format!(
            "**Now playing:** {} `{}`\n\n",
            music::track_title(track),
            music::track_length(track)
        ),
        None => String::new(),
    };

    if upcoming.is_empty() {
        description.push_str("The queue is empty.");
    } else {
        for (i, queued) in upcoming.iter().take(SHOWN).enumerate() {
            description.push_str(&format!(
                "`{}.` {} `{}`\n",
                i + 1,
                music::track_title(&queued.track),
                music::track_length(&queued.track)
            ));
        }
        if upcoming.len() > SHOWN {
            description.push_str(&format!("…and {} more", upcoming.len() - SHOWN));
        }
    }

    let total: u64 = upcoming
        .iter()
        .filter(|queued| !queued.track.info.is_stream)
        .map(|queued| queued.track.info.length)
        .sum();

    let embed = CreateEmbed::new()
        .colour(colors::MAIN)
        .title("Queue")
        .description(description)
        .footer(CreateEmbedFooter::new(format!(
            "{} tracks · {}",
            upcoming.len(),
            format_clock(total)
        )));

    inv.reply(&ctx.http, CommandReply::embed(embed)).await
}
