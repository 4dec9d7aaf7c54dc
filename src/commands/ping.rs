//! /ping command - REST latency and uptime.

use std::time::{Duration, Instant};

use anyhow::Result;
use serenity::all::{Context, CreateEmbed};

use super::{anywhere_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation};
use crate::resources::colors;
use crate::state::Data;
use crate::utils::format_duration;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: anywhere_command("ping", "Check the bot's latency"),
        meta: CommandMeta {
            cooldown: Some(Duration::from_secs(3)),
            aliases: &["latency"],
            usage: "ping",
            examples: &["{prefix}ping", "/ping"],
            ..CommandMeta::new(Category::General)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let started = Instant::now();
    ctx.http.get_current_user().await?;
    let rest = started.elapsed();

    let embed = CreateEmbed::new()
        .colour(colors::MAIN)
        .title("🏓 Pong!")
        .field("REST", format!("{} ms", rest.as_millis()), true)
        .field("Uptime", format_duration(data.started_at.elapsed()), true);

    inv.reply(&ctx.http, CommandReply::embed(embed)).await
}
