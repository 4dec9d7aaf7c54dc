//! Bot commands, usable as slash commands or with the guild prefix.

mod about;
mod help;
mod invocation;
mod join;
mod language;
mod leave;
mod looping;
mod nowplaying;
mod pause;
mod ping;
mod play;
mod prefix;
mod queue;
mod registry;
mod remove;
mod seek;
mod shuffle;
mod skip;
mod stop;
mod volume;

pub use invocation::{ArgError, Args, CommandReply, Invocation, Source};
pub use registry::{
    Category, CommandDecl, CommandEntry, CommandMeta, CommandRegistry, PlayerRequirements,
    RegistryDefaults, RegistryError,
};

use anyhow::{bail, Result};
use serenity::all::Context;

use crate::config::Config;
use crate::state::Data;
use crate::sync::{CommandDefinition, ContextKind, IntegrationKind};

/// Every command the bot offers, in registration order.
pub fn declarations(config: &Config) -> Vec<CommandDecl> {
    vec![
        ping::declare(),
        about::declare(),
        help::declare(),
        language::declare(),
        prefix::declare(),
        play::declare(),
        skip::declare(),
        stop::declare(),
        pause::declare(),
        volume::declare(config.lavalink.max_volume),
        nowplaying::declare(),
        queue::declare(),
        join::declare(),
        leave::declare(),
        looping::declare(),
        seek::declare(),
        shuffle::declare(),
        remove::declare(),
    ]
}

/// Run the command an invocation resolved to.
pub async fn execute(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    match inv.entry.name() {
        "ping" => ping::run(ctx, data, inv).await,
        "about" => about::run(ctx, data, inv).await,
        "help" => help::run(ctx, data, inv).await,
        "language" => language::run(ctx, data, inv).await,
        "prefix" => prefix::run(ctx, data, inv).await,
        "play" => play::run(ctx, data, inv).await,
        "skip" => skip::run(ctx, data, inv).await,
        "stop" => stop::run(ctx, data, inv).await,
        "pause" => pause::run(ctx, data, inv).await,
        "volume" => volume::run(ctx, data, inv).await,
        "nowplaying" => nowplaying::run(ctx, data, inv).await,
        "queue" => queue::run(ctx, data, inv).await,
        "join" => join::run(ctx, data, inv).await,
        "leave" => leave::run(ctx, data, inv).await,
        "loop" => looping::run(ctx, data, inv).await,
        "seek" => seek::run(ctx, data, inv).await,
        "shuffle" => shuffle::run(ctx, data, inv).await,
        "remove" => remove::run(ctx, data, inv).await,
        other => bail!("command `{}` has no implementation", other),
    }
}

/// Autocomplete choices for a focused option, as `(name, value)` pairs.
pub fn autocomplete(data: &Data, command: &str, option: &str, input: &str) -> Vec<(String, String)> {
    match (command, option) {
        ("language", "language") => language::suggest(input),
        ("help", "command") => help::suggest(&data.registry, input),
        _ => Vec::new(),
    }
}

/// A slash command usable only inside servers the bot is installed in.
fn guild_command(name: &str, description: &str) -> CommandDefinition {
    CommandDefinition::new(name, description)
        .contexts([ContextKind::Guild])
        .integration_types([IntegrationKind::GuildInstall])
}

/// A slash command also usable in DMs with the bot.
fn anywhere_command(name: &str, description: &str) -> CommandDefinition {
    CommandDefinition::new(name, description)
        .contexts([ContextKind::Guild, ContextKind::BotDm])
        .integration_types([IntegrationKind::GuildInstall])
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    fn config() -> Config {
        let vars: HashMap<&str, &str> = [
            ("DISCORD_TOKEN", "token"),
            ("GUILD_ID", "123456789012345678"),
            ("MONGO_URI", "mongodb://localhost:27017"),
        ]
        .into_iter()
        .collect();
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn every_declaration_is_valid() {
        let registry = CommandRegistry::new(
            declarations(&config()),
            RegistryDefaults {
                global: false,
                cooldown: Duration::from_secs(5),
            },
        )
        .unwrap();

        assert_eq!(registry.iter().count(), 18);
        assert_eq!(registry.resolve("p").map(CommandEntry::name), Some("play"));
        assert_eq!(registry.resolve("np").map(CommandEntry::name), Some("nowplaying"));
        assert_eq!(registry.resolve("dc").map(CommandEntry::name), Some("leave"));
        assert_eq!(registry.resolve("repeat").map(CommandEntry::name), Some("loop"));
    }

    #[test]
    fn declared_commands_pin_their_surfaces() {
        for declared in declarations(&config()) {
            let definition = &declared.definition;
            assert!(!definition.contexts.is_empty(), "{} has no contexts", definition.name);
            assert!(
                !definition.integration_types.is_empty(),
                "{} has no integration types",
                definition.name
            );
        }
    }

    #[test]
    fn prefix_usages_fit_their_minimum_arguments() {
        for declared in declarations(&config()) {
            let required = declared
                .definition
                .options
                .iter()
                .filter(|option| option.required)
                .count();
            assert_eq!(declared.meta.min_args, required, "{}", declared.definition.name);
            assert!(!declared.meta.usage.is_empty(), "{}", declared.definition.name);
        }
    }
}
