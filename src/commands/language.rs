//! /language command - switch the guild locale.

use std::time::Duration;

use anyhow::{Context as _, Result};
use serenity::all::{Context, Permissions};

use super::{guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation};
use crate::resources::{find_locale, search_locales};
use crate::state::Data;
use crate::sync::{OptionKind, OptionNode};

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("language", "Change the bot language for this server")
            .default_member_permissions(Permissions::MANAGE_GUILD.bits())
            .add_option(
                OptionNode::new(OptionKind::String, "language", "Language or locale code")
                    .required(true)
                    .autocomplete(true),
            ),
        meta: CommandMeta {
            cooldown: Some(Duration::from_secs(120)),
            guild_only: true,
            user_permissions: Permissions::MANAGE_GUILD,
            ephemeral: true,
            aliases: &["lng", "locale"],
            min_args: 1,
            usage: "language <language|locale>",
            examples: &["{prefix}language en-US", "/language language:pt-BR"],
            ..CommandMeta::new(Category::Config)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("language used outside a guild")?;
    let input = inv.args.string("language").unwrap_or_default();

    let Some(locale) = find_locale(input).or_else(|| search_locales(input).next()) else {
        let reply = CommandReply::error(format!("`{}` is not a supported language.", input));
        return inv.reply(&ctx.http, reply).await;
    };

    data.guilds.set_locale(guild_id, locale.code).await?;

    let reply = CommandReply::success(format!(
        "Language set to **{} ({})**.",
        locale.native, locale.name
    ));
    inv.reply(&ctx.http, reply).await
}

/// Up to 25 supported locales matching `input`.
pub fn suggest(input: &str) -> Vec<(String, String)> {
    search_locales(input)
        .take(25)
        .map(|locale| {
            (
                format!("{} ({})", locale.native, locale.name),
                locale.code.to_string(),
            )
        })
        .collect()
}
