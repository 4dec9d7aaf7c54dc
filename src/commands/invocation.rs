//! One command invocation, from a slash interaction or a prefixed message.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use serenity::all::{
    ChannelId, CommandDataOption, CommandDataOptionValue, CommandInteraction, CreateActionRow,
    CreateAllowedMentions, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse, GuildId, Http,
    Message, User,
};
use thiserror::Error;

use super::registry::CommandEntry;
use crate::resources::colors;
use crate::sync::{CommandDefinition, OptionKind};

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
}

#[derive(Debug, Error, PartialEq)]
pub enum ArgError {
    #[error("`{value}` is not a valid value for `{option}`")]
    Invalid { option: String, value: String },
}

/// Arguments by option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(HashMap<String, ArgValue>);

impl Args {
    pub fn from_slash(options: &[CommandDataOption]) -> Self {
        let values = options
            .iter()
            .filter_map(|option| {
                let value = match &option.value {
                    CommandDataOptionValue::String(value) => ArgValue::String(value.clone()),
                    CommandDataOptionValue::Integer(value) => ArgValue::Integer(*value),
                    CommandDataOptionValue::Number(value) => ArgValue::Number(*value),
                    CommandDataOptionValue::Boolean(value) => ArgValue::Boolean(*value),
                    _ => return None,
                };
                Some((option.name.clone(), value))
            })
            .collect();
        Self(values)
    }

    /// Map whitespace-separated words onto the command's options, in declaration order.
    ///
    /// A string option swallows every word not needed by the required options after it,
    /// so `play never gonna give you up` yields a single query.
    pub fn from_prefix(definition: &CommandDefinition, words: &[&str]) -> Result<Self, ArgError> {
        let options: Vec<_> = definition
            .options
            .iter()
            .filter(|option| !option.kind.is_subcommand())
            .collect();
        let mut values = HashMap::new();
        let mut rest = words;

        for (i, option) in options.iter().enumerate() {
            if rest.is_empty() {
                break;
            }

            let take = if option.kind == OptionKind::String {
                let reserved = options[i + 1..].iter().filter(|o| o.required).count();
                rest.len().saturating_sub(reserved).max(1)
            } else {
                1
            };
            let (taken, remaining) = rest.split_at(take.min(rest.len()));
            rest = remaining;

            let raw = taken.join(" ");
            let invalid = || ArgError::Invalid {
                option: option.name.clone(),
                value: raw.clone(),
            };
            let value = match option.kind {
                OptionKind::Integer => ArgValue::Integer(raw.parse().map_err(|_| invalid())?),
                OptionKind::Number => ArgValue::Number(raw.parse().map_err(|_| invalid())?),
                OptionKind::Boolean => ArgValue::Boolean(parse_bool(&raw).ok_or_else(invalid)?),
                _ => ArgValue::String(raw.clone()),
            };
            values.insert(option.name.clone(), value);
        }

        Ok(Self(values))
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ArgValue::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(ArgValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.0.get(name) {
            Some(ArgValue::Boolean(value)) => Some(*value),
            _ => None,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// A reply to a command: one embed, optional components.
#[derive(Debug, Clone)]
pub struct CommandReply {
    pub embed: CreateEmbed,
    pub components: Vec<CreateActionRow>,
    pub ephemeral: bool,
}

impl CommandReply {
    pub fn embed(embed: CreateEmbed) -> Self {
        Self {
            embed,
            components: Vec::new(),
            ephemeral: false,
        }
    }

    pub fn info(description: impl Into<String>) -> Self {
        Self::embed(CreateEmbed::new().colour(colors::MAIN).description(description))
    }

    pub fn success(description: impl Into<String>) -> Self {
        Self::embed(CreateEmbed::new().colour(colors::SUCCESS).description(description))
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::embed(CreateEmbed::new().colour(colors::ERROR).description(description)).ephemeral(true)
    }

    pub fn components(mut self, components: Vec<CreateActionRow>) -> Self {
        self.components = components;
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}

/// Where an invocation came from.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    Slash(&'a CommandInteraction),
    Prefix(&'a Message),
}

pub struct Invocation<'a> {
    pub source: Source<'a>,
    pub entry: &'a CommandEntry,
    pub args: Args,
    /// Prefix in effect where the command ran.
    pub prefix: String,
    pub locale: String,
    deferred: AtomicBool,
}

impl<'a> Invocation<'a> {
    pub fn new(source: Source<'a>, entry: &'a CommandEntry, args: Args, prefix: String, locale: String) -> Self {
        Self {
            source,
            entry,
            args,
            prefix,
            locale,
            deferred: AtomicBool::new(false),
        }
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        match self.source {
            Source::Slash(command) => command.guild_id,
            Source::Prefix(message) => message.guild_id,
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        match self.source {
            Source::Slash(command) => command.channel_id,
            Source::Prefix(message) => message.channel_id,
        }
    }

    pub fn user(&self) -> &User {
        match self.source {
            Source::Slash(command) => &command.user,
            Source::Prefix(message) => &message.author,
        }
    }

    /// Acknowledge a slow command. Prefix invocations show a typing indicator instead.
    pub async fn defer(&self, http: &Http) -> Result<()> {
        match self.source {
            Source::Slash(command) => {
                let response = CreateInteractionResponse::Defer(
                    CreateInteractionResponseMessage::new().ephemeral(self.entry.meta.ephemeral),
                );
                command.create_response(http, response).await?;
                self.deferred.store(true, Ordering::Release);
            }
            Source::Prefix(message) => message.channel_id.broadcast_typing(http).await?,
        }
        Ok(())
    }

    pub async fn reply(&self, http: &Http, reply: CommandReply) -> Result<()> {
        match self.source {
            Source::Slash(command) => {
                if self.deferred.load(Ordering::Acquire) {
                    let edit = EditInteractionResponse::new()
                        .embed(reply.embed)
                        .components(reply.components);
                    command.edit_response(http, edit).await?;
                } else {
                    let message = CreateInteractionResponseMessage::new()
                        .embed(reply.embed)
                        .components(reply.components)
                        .ephemeral(reply.ephemeral || self.entry.meta.ephemeral);
                    command
                        .create_response(http, CreateInteractionResponse::Message(message))
                        .await?;
                }
            }
            Source::Prefix(message) => {
                let builder = CreateMessage::new()
                    .embed(reply.embed)
                    .components(reply.components)
                    .reference_message(message)
                    .allowed_mentions(CreateAllowedMentions::new().replied_user(false));
                message.channel_id.send_message(http, builder).await?;
            }
        }
        Ok(())
    }
}
