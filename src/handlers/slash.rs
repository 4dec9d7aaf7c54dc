use serenity::all::{
    CommandInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
};
use tracing::{error, info, warn};

use super::checks::{self, Caller};
use super::{guild_settings, prefix_and_locale};
use crate::commands::{self, Args, CommandReply, Invocation, Source};
use crate::state::Data;
use crate::sync::{CommandPlatform, Scope};

pub async fn handle(ctx: &Context, data: &Data, command: &CommandInteraction) {
    let Some(entry) = data.registry.get(&command.data.name) else {
        unknown(ctx, data, command).await;
        return;
    };

    info!(
        "/{} used by {} in {:?}",
        entry.name(),
        command.user.name,
        command.guild_id
    );

    let settings = guild_settings(ctx, data, command.guild_id).await;
    let (prefix, locale) = prefix_and_locale(data, settings.as_ref());
    let inv = Invocation::new(
        Source::Slash(command),
        entry,
        Args::from_slash(&command.data.options),
        prefix,
        locale,
    );

    let caller = Caller {
        user: command.user.id,
        guild_id: command.guild_id,
        is_dev: data.config.is_dev(command.user.id),
        permissions: command.member.as_ref().and_then(|member| member.permissions),
        bot_permissions: command.app_permissions,
    };

    let checked = match checks::access(entry, &caller) {
        Ok(()) => checks::player(ctx, data, entry, &caller).await,
        Err(refusal) => Err(refusal),
    }
    .and_then(|()| checks::cooldown(&data.cooldowns, entry, &caller));

    if let Err(refusal) = checked {
        if let Err(e) = inv.reply(&ctx.http, CommandReply::error(refusal.to_string())).await {
            warn!("Failed to refuse /{}: {}", entry.name(), e);
        }
        return;
    }

    if let Err(e) = commands::execute(ctx, data, &inv).await {
        error!("/{} failed: {:?}", entry.name(), e);
        let reply = CommandReply::error("Something went wrong while running this command.");
        if let Err(e) = inv.reply(&ctx.http, reply).await {
            warn!("Failed to report error of /{}: {}", entry.name(), e);
        }
    }
}

/// A registered command the registry no longer knows: tell the user and unregister it.
async fn unknown(ctx: &Context, data: &Data, command: &CommandInteraction) {
    warn!("Received unknown command /{}", command.data.name);

    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .embed(CommandReply::error("This command no longer exists.").embed)
            .ephemeral(true),
    );
    if let Err(e) = command.create_response(&ctx.http, response).await {
        warn!("Failed to answer unknown command: {}", e);
    }

    let scope = match command.data.guild_id {
        Some(guild_id) => Scope::Guild(guild_id),
        None => Scope::Global,
    };
    match data
        .synchronizer
        .platform()
        .delete_command(command.data.id, scope)
        .await
    {
        Ok(()) => info!("DELETED stale command {} ({})", command.data.name, scope),
        Err(e) => warn!("Failed to delete stale command {}: {}", command.data.name, e),
    }
}
