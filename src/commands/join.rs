//! /join command - connect to the invoker's voice channel without playing.

use anyhow::{Context as _, Result};
use serenity::all::{ChannelId, Context, Permissions};

use super::{
    guild_command, Category, CommandDecl, CommandMeta, CommandReply, Invocation,
    PlayerRequirements,
};
use crate::music;
use crate::state::Data;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: guild_command("join", "Join your voice channel"),
        meta: CommandMeta {
            guild_only: true,
            bot_permissions: Permissions::CONNECT | Permissions::SPEAK,
            player: PlayerRequirements {
                voice: true,
                ..PlayerRequirements::default()
            },
            aliases: &["connect", "summon"],
            usage: "join",
            examples: &["{prefix}join", "/join"],
            ..CommandMeta::new(Category::Music)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let guild_id = inv.guild_id().context("join used outside a guild")?;
    let bot = ctx.cache.current_user().id;
    let user_channel = music::voice_channel(&ctx.cache, guild_id, inv.user().id);
    let bot_channel = data
        .lavalink
        .get_player_context(guild_id)
        .and(music::voice_channel(&ctx.cache, guild_id, bot));

    let channel = match join_target(user_channel, bot_channel) {
        Ok(channel) => channel,
        Err(message) => return inv.reply(&ctx.http, CommandReply::error(message)).await,
    };

    inv.defer(&ctx.http).await?;
    music::join(
        ctx,
        &data.lavalink,
        guild_id,
        channel,
        inv.channel_id(),
        data.config.lavalink.default_volume,
    )
    .await?;

    let reply = CommandReply::success(format!("Joined <#{}>.", channel));
    inv.reply(&ctx.http, reply).await
}

/// Channel to connect to. `bot` is where the bot's player is connected, if anywhere.
fn join_target(user: Option<ChannelId>, bot: Option<ChannelId>) -> Result<ChannelId, String> {
    match (user, bot) {
        (_, Some(bot)) => Err(format!("I am already connected to <#{}>.", bot)),
        (None, None) => Err("You must be in a voice channel to use this command.".to_string()),
        (Some(user), None) => Ok(user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joining_twice_is_refused() {
        let here = ChannelId::new(10);
        let there = ChannelId::new(11);

        assert_eq!(join_target(Some(here), None), Ok(here));
        assert!(join_target(Some(here), Some(there)).unwrap_err().contains("<#11>"));
        assert!(join_target(None, None).is_err());
    }
}
