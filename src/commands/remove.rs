//! /remove command - drop a track from the queue.

use anyhow::{Context as _, Result};
use serenity::all::Context;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::music;
use crate::state::Data;
use crate::sync::{OptionKind, OptionNode};

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("remove", "Remove a track from the queue").add_option(
            OptionNode::new(OptionKind::Integer, "number", "Position in /queue")
                .required(true)
                .min_value(1.0),
        ),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                ..PlayerRequirements::default()
            },
            aliases: &["rm", "del"],
            min_args: 1,
            usage: "remove <number>",
            examples: &["{prefix}remove 2", "/remove number:5"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("remove used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to remove tracks from")?;
    let number = inv.args.integer("number").unwrap_or_default();

    let queue = player.get_queue();
    let upcoming = queue.get_queue().await?;
    if upcoming.is_empty() {
        return inv.reply(&ctx.http, CommandReply::error("The queue is empty.")).await;
    }

    let Some(index) = queue_index(number, upcoming.len()) else {
        let reply = CommandReply::error(format!(
            "Pick a track between 1 and {}.",
            upcoming.len()
        ));
        return inv.reply(&ctx.http, reply).await;
    };

    let title = music::track_title(&upcoming[index].track);
    queue.remove(index)?;

    let reply = CommandReply::success(format!("Removed track {}: {}", number, title));
    inv.reply(&ctx.http, reply).await
}

/// Zero-based queue index of the one-based position shown by /queue.
fn queue_index(number: i64, len: usize) -> Option<usize> {
    let index = usize::try_from(number).ok()?.checked_sub(1)?;
    (index < len).then_some(index)
}
