//! /volume command - show or set the player volume.

use anyhow::{Context as _, Result};
use serenity::all::Context;

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::resources::emojis;
use crate::state::Data;
use crate::sync::{OptionKind, OptionNode};

pub fn declare(max_volume: u16) -> CommandDecl {
    CommandDecl {
        definition: guild_command("volume", "Show or change the player volume").add_option(
            OptionNode::new(OptionKind::Integer, "number", "New volume")
                .min_value(0.0)
                .max_value(f64::from(max_volume)),
        ),
        meta: CommandMeta {
            guild_only: true,
            player: PlayerRequirements {
                voice: true,
                active: true,
                ..PlayerRequirements::default()
            },
            aliases: &["v", "vol"],
            usage: "volume [0-max]",
            examples: &["{prefix}volume", "{prefix}volume 80", "/volume number:120"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("volume used outside a guild")?;
    let player = data
        .lavalink
        .get_player_context(guild_id)
        .context("no player to change the volume of")?;
    let max = data.config.lavalink.max_volume;

    let Some(requested) = inv.args.integer("number") else {
        let current = player.get_player().await?.volume;
        let reply = CommandReply::info(format!("{} Volume is **{}%**.", emojis::VOLUME_UP, current));
        return inv.reply(&ctx.http, reply).await;
    };

    let Some(volume) = bounded_volume(requested, max) else {
        let reply = CommandReply::error(format!("The volume must be between 0 and {}.", max));
        return inv.reply(&ctx.http, reply).await;
    };

    player.set_volume(volume).await?;
    let reply = CommandReply::success(format!("{} Volume set to **{}%**.", emojis::VOLUME_UP, volume));
    inv.reply(&ctx.http, reply).await
}

fn bounded_volume(requested: i64, max: u16) -> Option<u16> {
    u16::try_from(requested).ok().filter(|volume| *volume <= max)
}
