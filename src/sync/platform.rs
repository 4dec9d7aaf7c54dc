//! [`CommandPlatform`] over serenity's HTTP client.

use std::sync::Arc;

use serenity::all::{
    ChannelType, Command, CommandId, CommandOption, CommandOptionChoice, CommandOptionType,
    CommandType, CreateCommand, CreateCommandOption, GuildId, Http, InstallationContext,
    InteractionContext, Permissions,
};
use serenity::async_trait;
use serde_json::Value;

use super::model::{
    ChannelKind, Choice, ChoiceValue, CommandDefinition, CommandKind, ContextKind,
    IntegrationKind, Localizations, OptionKind, OptionNode,
};
use super::{CommandPlatform, LocalCommand, PlatformError, RegisteredCommand, Scope};

/// Discord application command endpoints, through serenity.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CommandPlatform for SerenityPlatform {
    async fn fetch_global_commands(&self) -> Result<Vec<RegisteredCommand>, PlatformError> {
        let commands = self.http.get_global_commands_with_localizations().await?;
        Ok(commands
            .into_iter()
            .map(|command| registered_from(command, true))
            .collect())
    }

    async fn fetch_guild_commands(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<RegisteredCommand>, PlatformError> {
        let commands = self
            .http
            .get_guild_commands_with_localizations(guild_id)
            .await?;
        Ok(commands
            .into_iter()
            .map(|command| registered_from(command, false))
            .collect())
    }

    async fn create_command(
        &self,
        command: &LocalCommand,
        scope: Scope,
    ) -> Result<(), PlatformError> {
        let builder = to_create_command(&command.definition);
        match scope {
            Scope::Global => {
                Command::create_global_command(&self.http, builder).await?;
            }
            Scope::Guild(guild_id) => {
                guild_id.create_command(&self.http, builder).await?;
            }
        }
        Ok(())
    }

    async fn edit_command(
        &self,
        id: CommandId,
        command: &LocalCommand,
        scope: Scope,
    ) -> Result<(), PlatformError> {
        let builder = to_create_command(&command.definition);
        match scope {
            Scope::Global => {
                Command::edit_global_command(&self.http, id, builder).await?;
            }
            Scope::Guild(guild_id) => {
                guild_id.edit_command(&self.http, id, builder).await?;
            }
        }
        Ok(())
    }

    async fn delete_command(&self, id: CommandId, scope: Scope) -> Result<(), PlatformError> {
        match scope {
            Scope::Global => Command::delete_global_command(&self.http, id).await?,
            Scope::Guild(guild_id) => guild_id.delete_command(&self.http, id).await?,
        }
        Ok(())
    }

    async fn set_commands(
        &self,
        commands: &[LocalCommand],
        scope: Scope,
    ) -> Result<(), PlatformError> {
        let builders = commands
            .iter()
            .map(|command| to_create_command(&command.definition))
            .collect();
        match scope {
            Scope::Global => {
                Command::set_global_commands(&self.http, builders).await?;
            }
            Scope::Guild(guild_id) => {
                guild_id.set_commands(&self.http, builders).await?;
            }
        }
        Ok(())
    }
}

fn localizations(map: Option<std::collections::HashMap<String, String>>) -> Localizations {
    map.unwrap_or_default().into_iter().collect()
}

fn registered_from(command: Command, global: bool) -> RegisteredCommand {
    let definition = CommandDefinition {
        kind: CommandKind::from(u8::from(command.kind)),
        name: command.name,
        description: command.description,
        name_localizations: localizations(command.name_localizations),
        description_localizations: localizations(command.description_localizations),
        options: command.options.into_iter().map(option_from).collect(),
        default_member_permissions: command.default_member_permissions.map(|p| p.bits()),
        nsfw: command.nsfw,
        contexts: command
            .contexts
            .unwrap_or_default()
            .into_iter()
            .map(|context| ContextKind::from(u8::from(context)))
            .collect(),
        integration_types: command
            .integration_types
            .into_iter()
            .map(|kind| IntegrationKind::from(u8::from(kind)))
            .collect(),
    };

    RegisteredCommand {
        id: command.id,
        global,
        definition,
    }
}

fn option_from(option: CommandOption) -> OptionNode {
    let kind = OptionKind::from(u8::from(option.kind));
    OptionNode {
        kind,
        name: option.name,
        description: option.description,
        name_localizations: localizations(option.name_localizations),
        description_localizations: localizations(option.description_localizations),
        required: option.required,
        autocomplete: option.autocomplete,
        min_value: option.min_value.and_then(|n| n.as_f64()),
        max_value: option.max_value.and_then(|n| n.as_f64()),
        min_length: option.min_length,
        max_length: option.max_length,
        choices: option
            .choices
            .into_iter()
            .map(|choice| choice_from(choice, kind))
            .collect(),
        channel_types: option
            .channel_types
            .into_iter()
            .map(|kind| ChannelKind(u8::from(kind)))
            .collect(),
        options: option.options.into_iter().map(option_from).collect(),
    }
}

/// Choice values are typed by the option holding them: Discord sends `5` for a
/// number choice of `5.0`.
fn choice_from(choice: CommandOptionChoice, kind: OptionKind) -> Choice {
    let value = match (choice.value, kind) {
        (Value::String(value), _) => ChoiceValue::String(value),
        (Value::Number(number), OptionKind::Number) => {
            ChoiceValue::Number(number.as_f64().unwrap_or_default())
        }
        (Value::Number(number), _) => match number.as_i64() {
            Some(value) => ChoiceValue::Integer(value),
            None => ChoiceValue::Number(number.as_f64().unwrap_or_default()),
        },
        (other, _) => ChoiceValue::String(other.to_string()),
    };

    Choice {
        name: choice.name,
        value,
        name_localizations: localizations(choice.name_localizations),
    }
}

/// Build the registration payload for a local definition.
pub fn to_create_command(definition: &CommandDefinition) -> CreateCommand {
    let mut builder = CreateCommand::new(&definition.name)
        .kind(CommandType::from(u8::from(definition.kind)))
        .nsfw(definition.nsfw);

    if definition.kind == CommandKind::ChatInput {
        builder = builder.description(&definition.description);
    }
    for (locale, name) in &definition.name_localizations {
        builder = builder.name_localized(locale, name);
    }
    for (locale, description) in &definition.description_localizations {
        builder = builder.description_localized(locale, description);
    }
    if let Some(bits) = definition.default_member_permissions {
        builder = builder.default_member_permissions(Permissions::from_bits_truncate(bits));
    }
    if !definition.contexts.is_empty() {
        builder = builder.contexts(
            definition
                .contexts
                .iter()
                .map(|context| InteractionContext::from(u8::from(*context)))
                .collect(),
        );
    }
    if !definition.integration_types.is_empty() {
        builder = builder.integration_types(
            definition
                .integration_types
                .iter()
                .map(|kind| InstallationContext::from(u8::from(*kind)))
                .collect(),
        );
    }
    for option in &definition.options {
        builder = builder.add_option(to_create_option(option));
    }

    builder
}

fn to_create_option(option: &OptionNode) -> CreateCommandOption {
    let mut builder = CreateCommandOption::new(
        CommandOptionType::from(u8::from(option.kind)),
        &option.name,
        &option.description,
    )
    .required(option.required)
    .set_autocomplete(option.autocomplete);

    for (locale, name) in &option.name_localizations {
        builder = builder.name_localized(locale, name);
    }
    for (locale, description) in &option.description_localizations {
        builder = builder.description_localized(locale, description);
    }

    match option.kind {
        // The registry only admits whole, non-negative integer bounds.
        OptionKind::Integer => {
            if let Some(min) = option.min_value {
                builder = builder.min_int_value(min as u64);
            }
            if let Some(max) = option.max_value {
                builder = builder.max_int_value(max as u64);
            }
        }
        OptionKind::Number => {
            if let Some(min) = option.min_value {
                builder = builder.min_number_value(min);
            }
            if let Some(max) = option.max_value {
                builder = builder.max_number_value(max);
            }
        }
        _ => {}
    }

    if let Some(min) = option.min_length {
        builder = builder.min_length(min);
    }
    if let Some(max) = option.max_length {
        builder = builder.max_length(max);
    }

    for choice in &option.choices {
        let locales = choice.name_localizations.iter();
        builder = match &choice.value {
            ChoiceValue::String(value) => {
                builder.add_string_choice_localized(&choice.name, value, locales)
            }
            ChoiceValue::Integer(value) => builder.add_int_choice_localized(
                &choice.name,
                (*value).try_into().unwrap_or_default(),
                locales,
            ),
            ChoiceValue::Number(value) => {
                builder.add_number_choice_localized(&choice.name, *value, locales)
            }
        };
    }

    if !option.channel_types.is_empty() {
        builder = builder.channel_types(
            option
                .channel_types
                .iter()
                .map(|kind| ChannelType::from(kind.0))
                .collect(),
        );
    }

    for sub_option in &option.options {
        builder = builder.add_sub_option(to_create_option(sub_option));
    }

    builder
}
