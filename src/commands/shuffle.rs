//! /shuffle command - shuffle the upcoming tracks.

use std::collections::VecDeque;

use anyhow::{Context as _, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serenity::all::Context;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::resources::emojis;
use crate::state::Data;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("shuffle", "Shuffle the upcoming tracks"),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                ..PlayerRequirements::default()
            },
            aliases: &["shuf", "mix"],
            usage: "shuffle",
            examples: &["{prefix}shuffle", "/shuffle"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("shuffle used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to shuffle")?;

    let queue = player.get_queue();
    let upcoming = queue.get_queue().await?;
    let count = upcoming.len();

    // The thread-local rng must not live across an await.
    let reordered = shuffled(upcoming, &mut rand::thread_rng());
    let Some(reordered) = reordered else {
        let reply = CommandReply::error("There must be at least two tracks in the queue.");
        return inv.reply(&ctx.http, reply).await;
    };
    queue.replace(reordered)?;

    let reply = CommandReply::success(format!("{} Shuffled **{}** tracks.", emojis::SHUFFLE, count));
    inv.reply(&ctx.http, reply).await
}

/// `None` when there is nothing to reorder.
fn shuffled<T>(tracks: VecDeque<T>, rng: &mut impl Rng) -> Option<VecDeque<T>> {
    if tracks.len() < 2 {
        return None;
    }
    let mut tracks: Vec<T> = tracks.into();
    tracks.shuffle(rng);
    Some(tracks.into())
}
