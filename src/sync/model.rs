//! Platform-independent application command model.
//!
//! Local definitions and fetched registrations share one shape
//! ([`CommandDefinition`]); they differ only in scope bookkeeping and the
//! platform-assigned id.

use std::collections::BTreeMap;
use std::fmt;

use serenity::all::{CommandId, GuildId};

/// Locale code (e.g. `pt-BR`) to translated text.
pub type Localizations = BTreeMap<String, String>;

/// Kind of application command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ChatInput,
    User,
    Message,
    Unknown(u8),
}

impl From<u8> for CommandKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::ChatInput,
            2 => Self::User,
            3 => Self::Message,
            other => Self::Unknown(other),
        }
    }
}

impl From<CommandKind> for u8 {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::ChatInput => 1,
            CommandKind::User => 2,
            CommandKind::Message => 3,
            CommandKind::Unknown(other) => other,
        }
    }
}

/// Type of a command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
    Unknown(u8),
}

impl OptionKind {
    /// Whether options of this kind carry their own nested options.
    pub fn is_subcommand(self) -> bool {
        matches!(self, Self::SubCommand | Self::SubCommandGroup)
    }

    pub fn accepts_choices(self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Number)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }
}

impl From<u8> for OptionKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::SubCommand,
            2 => Self::SubCommandGroup,
            3 => Self::String,
            4 => Self::Integer,
            5 => Self::Boolean,
            6 => Self::User,
            7 => Self::Channel,
            8 => Self::Role,
            9 => Self::Mentionable,
            10 => Self::Number,
            11 => Self::Attachment,
            other => Self::Unknown(other),
        }
    }
}

impl From<OptionKind> for u8 {
    fn from(kind: OptionKind) -> Self {
        match kind {
            OptionKind::SubCommand => 1,
            OptionKind::SubCommandGroup => 2,
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Mentionable => 9,
            OptionKind::Number => 10,
            OptionKind::Attachment => 11,
            OptionKind::Unknown(other) => other,
        }
    }
}

/// Surface a command can be invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKind {
    Guild,
    BotDm,
    PrivateChannel,
    Unknown(u8),
}

impl From<u8> for ContextKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Guild,
            1 => Self::BotDm,
            2 => Self::PrivateChannel,
            other => Self::Unknown(other),
        }
    }
}

impl From<ContextKind> for u8 {
    fn from(kind: ContextKind) -> Self {
        match kind {
            ContextKind::Guild => 0,
            ContextKind::BotDm => 1,
            ContextKind::PrivateChannel => 2,
            ContextKind::Unknown(other) => other,
        }
    }
}

/// Install target of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntegrationKind {
    GuildInstall,
    UserInstall,
    Unknown(u8),
}

impl From<u8> for IntegrationKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::GuildInstall,
            1 => Self::UserInstall,
            other => Self::Unknown(other),
        }
    }
}

impl From<IntegrationKind> for u8 {
    fn from(kind: IntegrationKind) -> Self {
        match kind {
            IntegrationKind::GuildInstall => 0,
            IntegrationKind::UserInstall => 1,
            IntegrationKind::Unknown(other) => other,
        }
    }
}

/// Raw Discord channel type, as accepted by channel options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKind(pub u8);

impl ChannelKind {
    pub const TEXT: Self = Self(0);
    pub const VOICE: Self = Self(2);
    pub const CATEGORY: Self = Self(4);
    pub const NEWS: Self = Self(5);
    pub const STAGE: Self = Self(13);
    pub const FORUM: Self = Self(15);
}

/// Value carried by an option choice.
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceValue {
    String(String),
    Integer(i64),
    Number(f64),
}

impl fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceValue::String(value) => write!(f, "{}", value),
            ChoiceValue::Integer(value) => write!(f, "{}", value),
            ChoiceValue::Number(value) => write!(f, "{}", value),
        }
    }
}

/// A predefined choice of a string, integer or number option.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub name: String,
    pub value: ChoiceValue,
    pub name_localizations: Localizations,
}

impl Choice {
    pub fn new(name: impl Into<String>, value: ChoiceValue) -> Self {
        Self {
            name: name.into(),
            value,
            name_localizations: Localizations::new(),
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ChoiceValue::String(value.into()))
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, ChoiceValue::Integer(value))
    }

    pub fn name_localized(mut self, locale: impl Into<String>, name: impl Into<String>) -> Self {
        self.name_localizations.insert(locale.into(), name.into());
        self
    }
}

/// One node of a command's option tree.
///
/// Absent numeric constraints are `None`; the change detector treats them as `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionNode {
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    pub name_localizations: Localizations,
    pub description_localizations: Localizations,
    pub required: bool,
    pub autocomplete: bool,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<u16>,
    pub max_length: Option<u16>,
    pub choices: Vec<Choice>,
    pub channel_types: Vec<ChannelKind>,
    pub options: Vec<OptionNode>,
}

impl OptionNode {
    pub fn new(kind: OptionKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            name_localizations: Localizations::new(),
            description_localizations: Localizations::new(),
            required: false,
            autocomplete: false,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            choices: Vec::new(),
            channel_types: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = autocomplete;
        self
    }

    pub fn min_value(mut self, value: f64) -> Self {
        self.min_value = Some(value);
        self
    }

    pub fn max_value(mut self, value: f64) -> Self {
        self.max_value = Some(value);
        self
    }

    pub fn min_length(mut self, length: u16) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn max_length(mut self, length: u16) -> Self {
        self.max_length = Some(length);
        self
    }

    pub fn add_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    pub fn add_channel_type(mut self, kind: ChannelKind) -> Self {
        self.channel_types.push(kind);
        self
    }

    pub fn add_sub_option(mut self, option: OptionNode) -> Self {
        self.options.push(option);
        self
    }

    pub fn name_localized(mut self, locale: impl Into<String>, name: impl Into<String>) -> Self {
        self.name_localizations.insert(locale.into(), name.into());
        self
    }

    pub fn description_localized(
        mut self,
        locale: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.description_localizations
            .insert(locale.into(), description.into());
        self
    }
}

/// The parts of an application command that are compared during sync.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDefinition {
    pub kind: CommandKind,
    pub name: String,
    pub description: String,
    pub name_localizations: Localizations,
    pub description_localizations: Localizations,
    pub options: Vec<OptionNode>,
    /// Permission bitmask; `None` means everyone may use the command.
    pub default_member_permissions: Option<u64>,
    pub nsfw: bool,
    pub contexts: Vec<ContextKind>,
    pub integration_types: Vec<IntegrationKind>,
}

impl CommandDefinition {
    /// A chat-input (slash) command with no options.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::ChatInput,
            name: name.into(),
            description: description.into(),
            name_localizations: Localizations::new(),
            description_localizations: Localizations::new(),
            options: Vec::new(),
            default_member_permissions: None,
            nsfw: false,
            contexts: Vec::new(),
            integration_types: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn add_option(mut self, option: OptionNode) -> Self {
        self.options.push(option);
        self
    }

    pub fn default_member_permissions(mut self, bits: u64) -> Self {
        self.default_member_permissions = Some(bits);
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }

    pub fn contexts(mut self, contexts: impl IntoIterator<Item = ContextKind>) -> Self {
        self.contexts = contexts.into_iter().collect();
        self
    }

    pub fn integration_types(
        mut self,
        integration_types: impl IntoIterator<Item = IntegrationKind>,
    ) -> Self {
        self.integration_types = integration_types.into_iter().collect();
        self
    }

    pub fn name_localized(mut self, locale: impl Into<String>, name: impl Into<String>) -> Self {
        self.name_localizations.insert(locale.into(), name.into());
        self
    }

    pub fn description_localized(
        mut self,
        locale: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.description_localizations
            .insert(locale.into(), description.into());
        self
    }
}

/// Desired state of a command, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalCommand {
    pub definition: CommandDefinition,
    /// Register platform-wide instead of to the configured guild.
    pub global: bool,
}

impl LocalCommand {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Current platform state of a command, fetched fresh on every sync pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredCommand {
    pub id: CommandId,
    /// Derived from the endpoint that returned the command.
    pub global: bool,
    pub definition: CommandDefinition,
}

impl RegisteredCommand {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Registration scope. Global and guild commands live in different id spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Guild(GuildId),
}

impl Scope {
    pub fn resolve(global: bool, guild_id: GuildId) -> Self {
        if global {
            Self::Global
        } else {
            Self::Guild(guild_id)
        }
    }

    pub fn is_global(self) -> bool {
        matches!(self, Self::Global)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Guild(id) => write!(f, "guild {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_kind_raw_values_match_discord() {
        assert_eq!(u8::from(OptionKind::SubCommandGroup), 2);
        assert_eq!(u8::from(OptionKind::Integer), 4);
        assert_eq!(OptionKind::from(7), OptionKind::Channel);
        assert_eq!(OptionKind::from(42), OptionKind::Unknown(42));
        assert_eq!(u8::from(OptionKind::Unknown(42)), 42);
    }

    #[test]
    fn scope_resolution_follows_global_flag() {
        let guild = GuildId::new(1234);
        assert_eq!(Scope::resolve(true, guild), Scope::Global);
        assert_eq!(Scope::resolve(false, guild), Scope::Guild(guild));
        assert_eq!(Scope::Guild(guild).to_string(), "guild 1234");
    }
}
