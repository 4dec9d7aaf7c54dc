//! Pre-execution checks shared by slash and prefix dispatch.

use std::fmt;
use std::time::Duration;

use serenity::all::{ChannelId, Context, GuildId, Permissions, UserId};

use crate::commands::CommandEntry;
use crate::cooldown::CooldownTracker;
use crate::music;
use crate::state::Data;
use crate::utils::format_duration;

/// Why a command was not run. Displayed to the invoker.
#[derive(Debug, Clone, PartialEq)]
pub enum Refusal {
    Disabled,
    GuildOnly,
    DevOnly,
    MissingUserPermissions(Permissions),
    MissingBotPermissions(Permissions),
    NotInVoice,
    DifferentVoiceChannel(ChannelId),
    NoPlayer,
    NothingPlaying,
    Cooldown(Duration),
    MentionsEveryone,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::Disabled => write!(f, "This command is currently disabled."),
            Refusal::GuildOnly => write!(f, "This command can only be used in a server."),
            Refusal::DevOnly => write!(f, "This command is reserved for the bot developers."),
            Refusal::MissingUserPermissions(missing) => write!(
                f,
                "You need these permissions to use this command:\n{}",
                permission_list(*missing)
            ),
            Refusal::MissingBotPermissions(missing) => write!(
                f,
                "I need these permissions to run this command:\n{}",
                permission_list(*missing)
            ),
            Refusal::NotInVoice => write!(f, "You must be in a voice channel to use this command."),
            Refusal::DifferentVoiceChannel(channel) => {
                write!(f, "You must be in <#{}> to use this command.", channel)
            }
            Refusal::NoPlayer => write!(f, "There is no player in this server."),
            Refusal::NothingPlaying => write!(f, "Nothing is playing right now."),
            Refusal::Cooldown(remaining) => write!(
                f,
                "Please wait **{}** before using this command again.",
                format_duration((*remaining).max(Duration::from_secs(1)))
            ),
            Refusal::MentionsEveryone => write!(f, "Commands cannot mention @everyone or @here."),
        }
    }
}

fn permission_list(permissions: Permissions) -> String {
    permissions
        .get_permission_names()
        .iter()
        .map(|name| format!("- **{}**", name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Who is invoking a command, and with which permissions.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user: UserId,
    pub guild_id: Option<GuildId>,
    pub is_dev: bool,
    /// `None` outside guilds.
    pub permissions: Option<Permissions>,
    pub bot_permissions: Option<Permissions>,
}

/// Disabled, guild-only, dev-only and permission checks, in that order.
pub fn access(entry: &CommandEntry, caller: &Caller) -> Result<(), Refusal> {
    let meta = &entry.meta;

    if meta.disabled && !caller.is_dev {
        return Err(Refusal::Disabled);
    }
    if meta.guild_only && caller.guild_id.is_none() {
        return Err(Refusal::GuildOnly);
    }
    if meta.dev_only && !caller.is_dev {
        return Err(Refusal::DevOnly);
    }

    if let Some(permissions) = caller.permissions {
        let missing = meta.user_permissions & !permissions;
        if !missing.is_empty() && !permissions.administrator() {
            return Err(Refusal::MissingUserPermissions(missing));
        }
    }
    if let Some(permissions) = caller.bot_permissions {
        let missing = meta.bot_permissions & !permissions;
        if !missing.is_empty() && !permissions.administrator() {
            return Err(Refusal::MissingBotPermissions(missing));
        }
    }

    Ok(())
}

/// The invoker must be in voice, and in the bot's channel if the bot is connected.
pub fn voice(user_channel: Option<ChannelId>, bot_channel: Option<ChannelId>) -> Result<(), Refusal> {
    match (user_channel, bot_channel) {
        (None, _) => Err(Refusal::NotInVoice),
        (Some(user), Some(bot)) if user != bot => Err(Refusal::DifferentVoiceChannel(bot)),
        _ => Ok(()),
    }
}

/// Voice and player requirements of the command.
pub async fn player(ctx: &Context, data: &Data, entry: &CommandEntry, caller: &Caller) -> Result<(), Refusal> {
    let requirements = entry.meta.player;
    let Some(guild_id) = caller.guild_id else {
        return Ok(());
    };

    if requirements.voice {
        let bot = ctx.cache.current_user().id;
        voice(
            music::voice_channel(&ctx.cache, guild_id, caller.user),
            music::voice_channel(&ctx.cache, guild_id, bot),
        )?;
    }

    if requirements.active || requirements.playing {
        let player = data
            .lavalink
            .get_player_context(guild_id)
            .ok_or(Refusal::NoPlayer)?;

        if requirements.playing {
            let playing = matches!(player.get_player().await, Ok(state) if state.track.is_some());
            if !playing {
                return Err(Refusal::NothingPlaying);
            }
        }
    }

    Ok(())
}

/// Developers are never throttled.
pub fn cooldown(cooldowns: &CooldownTracker, entry: &CommandEntry, caller: &Caller) -> Result<(), Refusal> {
    if caller.is_dev {
        return Ok(());
    }
    match cooldowns.check(entry.name(), caller.user, entry.cooldown) {
        Some(remaining) => Err(Refusal::Cooldown(remaining)),
        None => Ok(()),
    }
}
