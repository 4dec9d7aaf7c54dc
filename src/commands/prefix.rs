//! /prefix command - change the guild's command prefix.

use std::time::Duration;

use anyhow::{Context as _, Result};
use serenity::all::{Context, Permissions};

use super::{guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation};
use crate::state::Data;
use crate::sync::{OptionKind, OptionNode};

const MAX_PREFIX: usize = 5;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("prefix", "Change the command prefix for this server")
            .default_member_permissions(Permissions::MANAGE_GUILD.bits())
            .add_option(
                OptionNode::new(OptionKind::String, "prefix", "The new prefix")
                    .required(true)
                    .min_length(1)
                    .max_length(MAX_PREFIX as u16),
            ),
        meta: CommandMeta {
            cooldown: Some(Duration::from_secs(30)),
            guild_only: true,
            user_permissions: Permissions::MANAGE_GUILD,
            aliases: &["setprefix"],
            min_args: 1,
            usage: "prefix <new prefix>",
            examples: &["{prefix}prefix ?", "/prefix prefix:$"],
            ..CommandMeta::new(Category::Config)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("prefix used outside a guild")?;
    let prefix = inv.args.string("prefix").unwrap_or_default();

    if let Err(problem) = validate_prefix(prefix) {
        return inv.reply(&ctx.http, CommandReply::error(problem)).await;
    }

    data.guilds.set_prefix(guild_id, prefix).await?;
    inv.reply(
        &ctx.http,
        CommandReply::success(format!("Prefix set to `{}`.", prefix)),
    )
    .await
}

fn validate_prefix(prefix: &str) -> Result<(), String> {
    let length = prefix.chars().count();
    if length == 0 || length > MAX_PREFIX {
        return Err(format!("The prefix must be 1 to {} characters long.", MAX_PREFIX));
    }
    if prefix.chars().any(char::is_whitespace) {
        return Err("The prefix cannot contain spaces.".to_string());
    }
    Ok(())
}
