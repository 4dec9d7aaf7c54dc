//! /help command - command list, or details of one command.

use anyhow::Result;
use serenity::all::{Context, CreateEmbed};

use super::{
    anywhere_command, Category, CommandDecl, CommandEntry, CommandMeta, CommandRegistry,
    CommandReply, Invocation,
};
use crate::resources::colors;
use crate::state::Data;
use crate::sync::{OptionKind, OptionNode};
use crate::utils::format_duration;

pub fn declare() -> CommandDecl {
    CommandDecl {
        definition: anywhere_command("help", "List commands or show how to use one").add_option(
            OptionNode::new(OptionKind::String, "command", "Command to show")
                .autocomplete(true)
                .max_length(32),
        ),
        meta: CommandMeta {
            cooldown: Some(std::time::Duration::ZERO),
            aliases: &["h", "commands"],
            usage: "help [command]",
            examples: &["{prefix}help", "{prefix}help play", "/help command:play"],
            ..CommandMeta::new(Category::General)
        },
    }
}

pub async fn run(ctx: &Context, data: &Data, inv: &Invocation<'_>) -> Result<()> {
    let reply = match inv.args.string("command") {
        Some(name) => match data.registry.resolve(name) {
            Some(entry) => CommandReply::embed(details(entry, &inv.prefix)),
            None => CommandReply::error(format!("No command named `{}`.", name)),
        },
        None => CommandReply::embed(overview(&data.registry, &inv.prefix)),
    };
    inv.reply(&ctx.http, reply).await
}

pub fn suggest(registry: &CommandRegistry, input: &str) -> Vec<(String, String)> {
    let input = input.to_lowercase();
    registry
        .iter()
        .filter(|entry| !entry.meta.dev_only && entry.name().contains(&input))
        .take(25)
        .map(|entry| (entry.name().to_string(), entry.name().to_string()))
        .collect()
}

fn overview(registry: &CommandRegistry, prefix: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .colour(colors::MAIN)
        .title("Commands")
        .description(format!(
            "Use `/help command:<name>` or `{}help <name>` for details.",
            prefix
        ));

    for (category, entries) in registry.by_category() {
        let names: Vec<String> = entries
            .iter()
            .filter(|entry| !entry.meta.dev_only && !entry.meta.disabled)
            .map(|entry| format!("`{}`", entry.name()))
            .collect();
        if !names.is_empty() {
            embed = embed.field(category_title(category), names.join(" "), false);
        }
    }
    embed
}

fn category_title(category: Category) -> String {
    let icon = match category {
        Category::General => "📋",
        Category::Music => "🎵",
        Category::Config => "⚙️",
    };
    format!("{} {}", icon, category)
}

fn details(entry: &CommandEntry, prefix: &str) -> CreateEmbed {
    let meta = &entry.meta;
    let mut embed = CreateEmbed::new()
        .colour(colors::MAIN)
        .title(format!("/{}", entry.name()))
        .description(entry.description())
        .field("Usage", format!("`{}{}`", prefix, meta.usage), false);

    if !meta.aliases.is_empty() {
        let aliases: Vec<String> = meta.aliases.iter().map(|alias| format!("`{}`", alias)).collect();
        embed = embed.field("Aliases", aliases.join(", "), true);
    }
    if !entry.cooldown.is_zero() {
        embed = embed.field("Cooldown", format_duration(entry.cooldown), true);
    }
    if !meta.user_permissions.is_empty() {
        embed = embed.field(
            "Permissions",
            meta.user_permissions.get_permission_names().join(", "),
            true,
        );
    }
    if !meta.examples.is_empty() {
        let examples: Vec<String> = meta
            .examples
            .iter()
            .map(|example| format!("- `{}`", example.replace("{prefix}", prefix)))
            .collect();
        embed = embed.field("Examples", examples.join("\n"), false);
    }
    embed
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::commands::{CommandDecl, RegistryDefaults};
    use crate::sync::CommandDefinition;

    fn registry() -> CommandRegistry {
        let names = ["play", "pause", "ping", "prefix"];
        CommandRegistry::new(
            names
                .iter()
                .map(|name| CommandDecl {
                    definition: CommandDefinition::new(*name, "Command"),
                    meta: CommandMeta::new(Category::General),
                })
                .collect(),
            RegistryDefaults {
                global: false,
                cooldown: Duration::from_secs(5),
            },
        )
        .unwrap()
    }

    #[test]
    fn suggestions_filter_by_substring() {
        let names: Vec<String> = suggest(&registry(), "PA")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["pause"]);
        assert_eq!(suggest(&registry(), "").len(), 4);
    }
}
