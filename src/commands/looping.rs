//! /loop command - repeat the current track or the whole queue.

use anyhow::{Context as _, Result};
use serenity::all::Context;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::music::{LoopMode, PlayerData};
use crate::resources::emojis;
use crate::state::Data;
use crate::sync::{Choice, OptionKind, OptionNode};

pub fn declare() -> CommandDecl {
    let mode = LoopMode::ALL.iter().fold(
        OptionNode::new(OptionKind::String, "mode", "What to repeat"),
        |option, mode| option.add_choice(Choice::string(mode.key(), mode.key())),
    );

    CommandDecl {
        definition: guild_command("loop", "Repeat the current track or the queue").add_option(mode),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                playing: true,
            },
            aliases: &["lp", "repeat"],
            usage: "loop [off|track|queue]",
            examples: &["{prefix}loop", "{prefix}loop queue", "/loop mode:track"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("loop used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to loop")?;
    let player_data = player.data::<PlayerData>()?;

    let current = player_data.playback().loop_mode;
    let Some(mode) = requested_mode(inv.args.string("mode"), current) else {
        let reply = CommandReply::error("Choose one of `off`, `track` or `queue`.");
        return inv.reply(&ctx.http, reply).await;
    };
    player_data.playback().loop_mode = mode;

    let reply = CommandReply::success(format!("{} {}", emojis::LOOP, mode.describe()));
    inv.reply(&ctx.http, reply).await
}

/// The named mode, or the one after `current` when none is given.
fn requested_mode(input: Option<&str>, current: LoopMode) -> Option<LoopMode> {
    match input {
        Some(input) => LoopMode::parse(input),
        None => Some(current.next()),
    }
}
