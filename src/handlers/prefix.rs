//! Commands typed as messages, like `!play lofi` or `@Bot play lofi`.

use serenity::all::{
    Context, CreateAllowedMentions, CreateEmbed, CreateEmbedFooter, CreateMessage, Message,
    Permissions, UserId,
};
use tracing::{debug, error, info, warn};

use super::checks::{self, Caller, Refusal};
use super::{guild_settings, prefix_and_locale};
use crate::commands::{self, Args, CommandEntry, CommandReply, Invocation, Source};
use crate::cooldown::CooldownTracker;
use crate::resources::colors;
use crate::state::Data;

/// What the bot needs in a channel just to answer there.
const BASE_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::EMBED_LINKS)
    .union(Permissions::READ_MESSAGE_HISTORY);

#[derive(Debug, PartialEq)]
enum Parsed {
    /// The message is only a mention of the bot.
    Mention,
    Command { name: String, args: Vec<String> },
}

/// Split a message into a command name and its words.
///
/// Messages may start with the guild prefix or a mention of the bot.
fn parse(content: &str, prefix: &str, bot_id: UserId) -> Option<Parsed> {
    let content = content.trim();
    let mentions = [format!("<@{}>", bot_id), format!("<@!{}>", bot_id)];

    if mentions.iter().any(|mention| content == mention) {
        return Some(Parsed::Mention);
    }

    let rest = mentions
        .iter()
        .find_map(|mention| content.strip_prefix(mention.as_str()))
        .or_else(|| content.strip_prefix(prefix).filter(|_| !prefix.is_empty()))?;

    let mut words = rest.split_whitespace();
    let name = words.next()?.to_lowercase();
    Some(Parsed::Command {
        name,
        args: words.map(str::to_string).collect(),
    })
}

fn mentions_everyone(args: &[String]) -> bool {
    args.iter()
        .any(|word| word.contains("@everyone") || word.contains("@here"))
}

pub async fn handle(ctx: &Context, data: &Data, message: &Message) {
    if message.author.bot || message.webhook_id.is_some() {
        return;
    }
    let Some(guild_id) = message.guild_id else {
        return;
    };

    let bot_id = ctx.cache.current_user().id;
    let settings = guild_settings(ctx, data, Some(guild_id)).await;
    let (prefix, locale) = prefix_and_locale(data, settings.as_ref());

    let (name, args) = match parse(&message.content, &prefix, bot_id) {
        None => return,
        Some(Parsed::Mention) => {
            let reply = CommandReply::info(format!(
                "My prefix here is `{0}`. Try `{0}help` or `/help`.",
                prefix
            ));
            send(ctx, message, reply).await;
            return;
        }
        Some(Parsed::Command { name, args }) => (name, args),
    };

    let Some(entry) = data.registry.resolve(&name) else {
        debug!("Ignoring unknown prefix command {}", name);
        return;
    };

    let (permissions, bot_permissions) = channel_permissions(ctx, message, bot_id);
    if let Some(bot_permissions) = bot_permissions {
        let missing = BASE_PERMISSIONS & !bot_permissions;
        if !missing.is_empty() && !bot_permissions.administrator() {
            notify_in_dm(ctx, message, missing).await;
            return;
        }
    }

    info!(
        "{}{} used by {} in guild {}",
        prefix,
        entry.name(),
        message.author.name,
        guild_id
    );

    let caller = Caller {
        user: message.author.id,
        guild_id: Some(guild_id),
        is_dev: data.config.is_dev(message.author.id),
        permissions,
        bot_permissions,
    };

    let checked = match checks::access(entry, &caller) {
        Ok(()) => checks::player(ctx, data, entry, &caller).await,
        Err(refusal) => Err(refusal),
    };
    if let Err(refusal) = checked {
        send(ctx, message, CommandReply::error(refusal.to_string())).await;
        return;
    }

    let parsed = match admit(entry, &args, &data.cooldowns, &caller) {
        Ok(parsed) => parsed,
        Err(Rejection::Usage(problem)) => {
            let mut embed = usage_embed(entry, &prefix);
            if let Some(problem) = problem {
                embed = embed.description(problem);
            }
            send(ctx, message, CommandReply::embed(embed)).await;
            return;
        }
        Err(Rejection::Refused(refusal)) => {
            send(ctx, message, CommandReply::error(refusal.to_string())).await;
            return;
        }
    };

    let inv = Invocation::new(Source::Prefix(message), entry, parsed, prefix, locale);
    if let Err(e) = commands::execute(ctx, data, &inv).await {
        error!("{} failed: {:?}", entry.name(), e);
        let reply = CommandReply::error("Something went wrong while running this command.");
        send(ctx, message, reply).await;
    }
}

#[derive(Debug, PartialEq)]
enum Rejection {
    /// Arguments missing or malformed, with the parse problem if any.
    Usage(Option<String>),
    Refused(Refusal),
}

/// Argument checks, then the cooldown. Only well-formed invocations start a cooldown.
fn admit(
    entry: &CommandEntry,
    args: &[String],
    cooldowns: &CooldownTracker,
    caller: &Caller,
) -> Result<Args, Rejection> {
    if args.len() < entry.meta.min_args {
        return Err(Rejection::Usage(None));
    }
    if mentions_everyone(args) {
        return Err(Rejection::Refused(Refusal::MentionsEveryone));
    }

    let words: Vec<&str> = args.iter().map(String::as_str).collect();
    let parsed = Args::from_prefix(&entry.command.definition, &words)
        .map_err(|e| Rejection::Usage(Some(e.to_string())))?;

    checks::cooldown(cooldowns, entry, caller).map_err(Rejection::Refused)?;
    Ok(parsed)
}

fn usage_embed(entry: &CommandEntry, prefix: &str) -> CreateEmbed {
    let meta = &entry.meta;
    let mut embed = CreateEmbed::new()
        .colour(colors::WARNING)
        .title("Missing arguments")
        .field("Usage", format!("`{}{}`", prefix, meta.usage), false)
        .footer(CreateEmbedFooter::new("<> required, [] optional"));

    if !meta.examples.is_empty() {
        let examples: Vec<String> = meta
            .examples
            .iter()
            .map(|example| format!("`{}`", example.replace("{prefix}", prefix)))
            .collect();
        embed = embed.field("Examples", examples.join("\n"), false);
    }
    embed
}

/// Permissions of the author and of the bot in the message's channel, from the cache.
fn channel_permissions(
    ctx: &Context,
    message: &Message,
    bot_id: UserId,
) -> (Option<Permissions>, Option<Permissions>) {
    let Some(guild) = message.guild_id.and_then(|id| ctx.cache.guild(id)) else {
        return (None, None);
    };
    let channel = guild.channels.get(&message.channel_id).or_else(|| {
        guild
            .threads
            .iter()
            .find(|thread| thread.id == message.channel_id)
    });
    let Some(channel) = channel else {
        return (None, None);
    };

    let author = message
        .member
        .as_ref()
        .map(|member| guild.partial_member_permissions_in(channel, message.author.id, member));
    let bot = guild
        .members
        .get(&bot_id)
        .map(|member| guild.user_permissions_in(channel, member));
    (author, bot)
}

async fn send(ctx: &Context, message: &Message, reply: CommandReply) {
    let builder = CreateMessage::new()
        .embed(reply.embed)
        .components(reply.components)
        .reference_message(message)
        .allowed_mentions(CreateAllowedMentions::new().replied_user(false));
    if let Err(e) = message.channel_id.send_message(&ctx.http, builder).await {
        warn!("Failed to reply in channel {}: {}", message.channel_id, e);
    }
}

/// The bot cannot answer in the channel, so tell the author privately.
async fn notify_in_dm(ctx: &Context, message: &Message, missing: Permissions) {
    let embed = CreateEmbed::new().colour(colors::ERROR).description(format!(
        "I need **{}** in <#{}> to answer commands there.",
        missing.get_permission_names().join(", "),
        message.channel_id
    ));
    if let Err(e) = message
        .author
        .direct_message(&ctx.http, CreateMessage::new().embed(embed))
        .await
    {
        debug!("Could not DM {}: {}", message.author.name, e);
    }
}
