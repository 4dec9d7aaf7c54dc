//! /about command - version, reach and links.

use anyhow::Result;
use serenity::all::{Context, CreateActionRow, CreateButton, CreateEmbed};

use super::{anywhere_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation};
use crate::resources::colors;
use crate::state::Data;
use crate::utils::format_duration;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: anywhere_command("about", "Information about the bot"),
        meta: CommandMeta {
            aliases: &["info", "botinfo"],
            usage: "about",
            examples: &["{prefix}about", "/about"],
            ..CommandMeta::new(Category::General)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let bot = ctx.cache.current_user().clone();

    let embed = CreateEmbed::new()
        .colour(colors::MAIN)
        .thumbnail(bot.face())
        .title(format!("About {}", bot.name))
        .field("Version", env!("CARGO_PKG_VERSION"), true)
        .field("Servers", ctx.cache.guild_count().to_string(), true)
        .field("Commands", data.registry.iter().count().to_string(), true)
        .field("Uptime", format_duration(data.started_at.elapsed()), true)
        .field("Prefix", format!("`{}`", inv.prefix), true);

    let config = &data.config;
    let buttons: Vec<CreateButton> = [
        ("Support", &config.support_server),
        ("GitHub", &config.github_repo),
        ("Website", &config.website),
    ]
    .into_iter()
    .filter_map(|(label, url)| url.as_ref().map(|url| CreateButton::new_link(url).label(label)))
    .collect();

    let mut reply = CommandReply::embed(embed);
    if !buttons.is_empty() {
        reply = reply.components(vec![CreateActionRow::Buttons(buttons)]);
    }
    inv.reply(&ctx.http, reply).await
}
