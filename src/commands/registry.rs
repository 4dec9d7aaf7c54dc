//! The local command registry: definitions plus dispatch metadata.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use serenity::all::Permissions;
use thiserror::Error;

use crate::sync::{ChoiceValue, CommandDefinition, CommandKind, LocalCommand, OptionKind, OptionNode};

const MAX_NAME: usize = 32;
const MAX_DESCRIPTION: usize = 100;
const MAX_OPTIONS: usize = 25;
const MAX_CHOICES: usize = 25;
/// Largest integer bound that survives the round trip through a JSON number.
const MAX_INTEGER_BOUND: f64 = 9_007_199_254_740_991.0;

/// Malformed local command definitions, caught before any network call.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("command `{command}`: invalid name `{name}`")]
    InvalidName { command: String, name: String },

    #[error("command `{command}`: description of `{name}` must be 1 to 100 characters")]
    InvalidDescription { command: String, name: String },

    #[error("command `{0}` is declared twice")]
    DuplicateName(String),

    #[error("command `{command}`: option `{option}` is declared twice")]
    DuplicateOption { command: String, option: String },

    #[error("command `{command}`: option `{option}` has two choices named `{choice}`")]
    DuplicateChoice {
        command: String,
        option: String,
        choice: String,
    },

    #[error("alias `{alias}` of `{command}` is already taken")]
    DuplicateAlias { alias: String, command: String },

    #[error("command `{command}`: `{name}` has more than 25 options")]
    TooManyOptions { command: String, name: String },

    #[error("command `{command}`: option `{option}` has more than 25 choices")]
    TooManyChoices { command: String, option: String },

    #[error("command `{command}`: option `{option}` is nested illegally")]
    InvalidNesting { command: String, option: String },

    #[error("command `{command}`: required option `{option}` follows an optional one")]
    RequiredAfterOptional { command: String, option: String },

    #[error("command `{command}`: option `{option}` cannot carry {constraint}")]
    MisplacedConstraint {
        command: String,
        option: String,
        constraint: &'static str,
    },

    #[error("command `{command}`: option `{option}` has an invalid range")]
    InvalidRange { command: String, option: String },

    #[error("command `{command}`: integer choice {value} of `{option}` does not fit 32 bits")]
    ChoiceOutOfRange {
        command: String,
        option: String,
        value: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    General,
    Music,
    Config,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::General => write!(f, "General"),
            Category::Music => write!(f, "Music"),
            Category::Config => write!(f, "Config"),
        }
    }
}

/// What a command needs from the guild's music player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerRequirements {
    /// Invoker must be in a voice channel the bot is not absent from elsewhere.
    pub voice: bool,
    /// A player must exist.
    pub active: bool,
    /// The player must have a current track.
    pub playing: bool,
}

/// Dispatch metadata of a command.
#[derive(Debug, Clone)]
pub struct CommandMeta {
    pub category: Category,
    /// `None` uses the configured default scope.
    pub global: Option<bool>,
    /// `None` uses the configured default cooldown.
    pub cooldown: Option<Duration>,
    pub guild_only: bool,
    pub dev_only: bool,
    pub disabled: bool,
    pub user_permissions: Permissions,
    pub bot_permissions: Permissions,
    pub ephemeral: bool,
    pub player: PlayerRequirements,
    pub aliases: &'static [&'static str],
    pub min_args: usize,
    pub usage: &'static str,
    pub examples: &'static [&'static str],
}

impl CommandMeta {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            global: None,
            cooldown: None,
            guild_only: false,
            dev_only: false,
            disabled: false,
            user_permissions: Permissions::empty(),
            bot_permissions: Permissions::empty(),
            ephemeral: false,
            player: PlayerRequirements::default(),
            aliases: &[],
            min_args: 0,
            usage: "",
            examples: &[],
        }
    }
}

/// A command as declared by its module, before defaults are applied.
#[derive(Debug, Clone)]
pub struct CommandDecl {
    pub definition: CommandDefinition,
    pub meta: CommandMeta,
}

/// Registry defaults taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct RegistryDefaults {
    pub global: bool,
    pub cooldown: Duration,
}

/// A validated command with its scope and cooldown resolved.
#[derive(Debug, Clone)]
pub struct CommandEntry {
    pub command: LocalCommand,
    pub meta: CommandMeta,
    pub cooldown: Duration,
}

impl CommandEntry {
    pub fn name(&self) -> &str {
        self.command.name()
    }

    pub fn description(&self) -> &str {
        &self.command.definition.description
    }
}

/// All local commands, indexed by name and prefix alias.
#[derive(Debug)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new(
        declared: Vec<CommandDecl>,
        defaults: RegistryDefaults,
    ) -> Result<Self, RegistryError> {
        let mut entries = Vec::with_capacity(declared.len());
        let mut index = HashMap::new();

        for CommandDecl { definition, meta } in declared {
            validate(&definition)?;

            let name = definition.name.to_lowercase();
            if index.insert(name.clone(), entries.len()).is_some() {
                return Err(RegistryError::DuplicateName(definition.name));
            }
            for alias in meta.aliases {
                if index.insert(alias.to_lowercase(), entries.len()).is_some() {
                    return Err(RegistryError::DuplicateAlias {
                        alias: alias.to_string(),
                        command: definition.name,
                    });
                }
            }

            entries.push(CommandEntry {
                command: LocalCommand {
                    global: meta.global.unwrap_or(defaults.global),
                    definition,
                },
                cooldown: meta.cooldown.unwrap_or(defaults.cooldown),
                meta,
            });
        }

        Ok(Self { entries, index })
    }

    /// Exact lookup by command name, as sent by slash interactions.
    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// Case-insensitive lookup by name or alias, for prefix invocations.
    pub fn resolve(&self, name_or_alias: &str) -> Option<&CommandEntry> {
        self.index
            .get(&name_or_alias.to_lowercase())
            .map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    /// Desired registration state handed to the synchronizer.
    pub fn local_commands(&self) -> Vec<LocalCommand> {
        self.entries.iter().map(|entry| entry.command.clone()).collect()
    }

    pub fn by_category(&self) -> BTreeMap<Category, Vec<&CommandEntry>> {
        let mut categories: BTreeMap<Category, Vec<&CommandEntry>> = BTreeMap::new();
        for entry in &self.entries {
            categories.entry(entry.meta.category).or_default().push(entry);
        }
        categories
    }
}

fn validate(definition: &CommandDefinition) -> Result<(), RegistryError> {
    let command = definition.name.as_str();

    if definition.kind == CommandKind::ChatInput {
        check_name(command, command)?;
        check_description(command, command, &definition.description)?;
    } else if definition.name.is_empty() || definition.name.chars().count() > MAX_NAME {
        return Err(RegistryError::InvalidName {
            command: command.to_string(),
            name: definition.name.clone(),
        });
    }

    check_options(command, command, &definition.options, 0)
}

fn check_name(command: &str, name: &str) -> Result<(), RegistryError> {
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_NAME
        && name
            .chars()
            .all(|c| (c.is_alphanumeric() && !c.is_uppercase()) || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName {
            command: command.to_string(),
            name: name.to_string(),
        })
    }
}

fn check_description(command: &str, name: &str, description: &str) -> Result<(), RegistryError> {
    let length = description.chars().count();
    if (1..=MAX_DESCRIPTION).contains(&length) {
        Ok(())
    } else {
        Err(RegistryError::InvalidDescription {
            command: command.to_string(),
            name: name.to_string(),
        })
    }
}

/// `depth` is 0 for top-level options, 1 inside a subcommand or group, 2 inside a grouped subcommand.
fn check_options(
    command: &str,
    parent: &str,
    options: &[OptionNode],
    depth: usize,
) -> Result<(), RegistryError> {
    if options.len() > MAX_OPTIONS {
        return Err(RegistryError::TooManyOptions {
            command: command.to_string(),
            name: parent.to_string(),
        });
    }

    let has_subcommands = options.iter().any(|option| option.kind.is_subcommand());
    let mut seen_optional = false;
    let mut names = HashSet::new();

    for option in options {
        let nesting = || RegistryError::InvalidNesting {
            command: command.to_string(),
            option: option.name.clone(),
        };
        let misplaced = |constraint| RegistryError::MisplacedConstraint {
            command: command.to_string(),
            option: option.name.clone(),
            constraint,
        };

        check_name(command, &option.name)?;
        check_description(command, &option.name, &option.description)?;
        if !names.insert(option.name.as_str()) {
            return Err(RegistryError::DuplicateOption {
                command: command.to_string(),
                option: option.name.clone(),
            });
        }

        if has_subcommands != option.kind.is_subcommand() {
            return Err(nesting());
        }

        match option.kind {
            OptionKind::SubCommandGroup => {
                if depth > 0 || !option.options.iter().all(|o| o.kind == OptionKind::SubCommand) {
                    return Err(nesting());
                }
                check_options(command, &option.name, &option.options, depth + 1)?;
                continue;
            }
            OptionKind::SubCommand => {
                if depth > 1 || option.options.iter().any(|o| o.kind.is_subcommand()) {
                    return Err(nesting());
                }
                check_options(command, &option.name, &option.options, depth + 1)?;
                continue;
            }
            _ if !option.options.is_empty() => return Err(nesting()),
            _ => {}
        }

        if option.required && seen_optional {
            return Err(RegistryError::RequiredAfterOptional {
                command: command.to_string(),
                option: option.name.clone(),
            });
        }
        seen_optional |= !option.required;

        if (option.min_value.is_some() || option.max_value.is_some()) && !option.kind.is_numeric() {
            return Err(misplaced("min/max values"));
        }
        if (option.min_length.is_some() || option.max_length.is_some())
            && option.kind != OptionKind::String
        {
            return Err(misplaced("min/max lengths"));
        }
        if !option.channel_types.is_empty() && option.kind != OptionKind::Channel {
            return Err(misplaced("channel types"));
        }
        if !option.choices.is_empty() && !option.kind.accepts_choices() {
            return Err(misplaced("choices"));
        }
        if !option.choices.is_empty() && option.autocomplete {
            return Err(misplaced("both choices and autocomplete"));
        }

        let inverted_values = matches!((option.min_value, option.max_value), (Some(min), Some(max)) if min > max);
        let inverted_lengths = matches!((option.min_length, option.max_length), (Some(min), Some(max)) if min > max);
        // Integer bounds are registered as whole, non-negative numbers.
        let bad_integer_bound = option.kind == OptionKind::Integer
            && [option.min_value, option.max_value]
                .into_iter()
                .flatten()
                .any(|bound| bound.fract() != 0.0 || !(0.0..=MAX_INTEGER_BOUND).contains(&bound));
        if inverted_values || inverted_lengths || bad_integer_bound {
            return Err(RegistryError::InvalidRange {
                command: command.to_string(),
                option: option.name.clone(),
            });
        }

        if option.choices.len() > MAX_CHOICES {
            return Err(RegistryError::TooManyChoices {
                command: command.to_string(),
                option: option.name.clone(),
            });
        }
        let mut choice_names = HashSet::new();
        for choice in &option.choices {
            if !choice_names.insert(choice.name.as_str()) {
                return Err(RegistryError::DuplicateChoice {
                    command: command.to_string(),
                    option: option.name.clone(),
                    choice: choice.name.clone(),
                });
            }
            if let ChoiceValue::Integer(value) = choice.value {
                if i32::try_from(value).is_err() {
                    return Err(RegistryError::ChoiceOutOfRange {
                        command: command.to_string(),
                        option: option.name.clone(),
                        value,
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{ChannelKind, Choice};

    fn decl(definition: CommandDefinition) -> CommandDecl {
        CommandDecl {
            definition,
            meta: CommandMeta::new(Category::General),
        }
    }

    fn defaults() -> RegistryDefaults {
        RegistryDefaults {
            global: false,
            cooldown: Duration::from_secs(5),
        }
    }

    fn rejects(definition: CommandDefinition) -> RegistryError {
        CommandRegistry::new(vec![decl(definition)], defaults()).unwrap_err()
    }

    #[test]
    fn defaults_fill_scope_and_cooldown() {
        let mut about = decl(CommandDefinition::new("about", "About the bot"));
        about.meta.global = Some(true);
        about.meta.cooldown = Some(Duration::ZERO);

        let registry = CommandRegistry::new(
            vec![decl(CommandDefinition::new("ping", "Pong")), about],
            defaults(),
        )
        .unwrap();

        let ping = registry.get("ping").unwrap();
        assert!(!ping.command.global);
        assert_eq!(ping.cooldown, Duration::from_secs(5));

        let about = registry.get("about").unwrap();
        assert!(about.command.global);
        assert_eq!(about.cooldown, Duration::ZERO);
    }

    #[test]
    fn resolve_matches_aliases_case_insensitively() {
        let mut play = decl(CommandDefinition::new("play", "Play a song"));
        play.meta.aliases = &["p"];
        let registry = CommandRegistry::new(vec![play], defaults()).unwrap();

        assert_eq!(registry.resolve("P").map(CommandEntry::name), Some("play"));
        assert_eq!(registry.resolve("PLAY").map(CommandEntry::name), Some("play"));
        assert!(registry.get("p").is_none());
    }

    #[test]
    fn duplicate_names_and_aliases_are_rejected() {
        let error = CommandRegistry::new(
            vec![
                decl(CommandDefinition::new("ping", "Pong")),
                decl(CommandDefinition::new("ping", "Pong again")),
            ],
            defaults(),
        )
        .unwrap_err();
        assert_eq!(error, RegistryError::DuplicateName("ping".into()));

        let mut skip = decl(CommandDefinition::new("skip", "Skip"));
        skip.meta.aliases = &["ping"];
        let error = CommandRegistry::new(
            vec![decl(CommandDefinition::new("ping", "Pong")), skip],
            defaults(),
        )
        .unwrap_err();
        assert!(matches!(error, RegistryError::DuplicateAlias { .. }));
    }

    #[test]
    fn local_commands_keep_declaration_order() {
        let registry = CommandRegistry::new(
            vec![
                decl(CommandDefinition::new("ping", "Pong")),
                decl(CommandDefinition::new("help", "Help")),
            ],
            defaults(),
        )
        .unwrap();

        let names: Vec<_> = registry
            .local_commands()
            .into_iter()
            .map(|command| command.definition.name)
            .collect();
        assert_eq!(names, ["ping", "help"]);
    }

    #[test]
    fn by_category_groups_entries() {
        let mut play = decl(CommandDefinition::new("play", "Play"));
        play.meta.category = Category::Music;
        let registry = CommandRegistry::new(
            vec![decl(CommandDefinition::new("ping", "Pong")), play],
            defaults(),
        )
        .unwrap();

        let categories = registry.by_category();
        assert_eq!(categories[&Category::General].len(), 1);
        assert_eq!(categories[&Category::Music][0].name(), "play");
    }

    #[test]
    fn names_must_be_lowercase_and_short() {
        assert!(matches!(
            rejects(CommandDefinition::new("Ping", "Pong")),
            RegistryError::InvalidName { .. }
        ));
        assert!(matches!(
            rejects(CommandDefinition::new("a".repeat(33), "Pong")),
            RegistryError::InvalidName { .. }
        ));
        assert!(matches!(
            rejects(CommandDefinition::new("ping", "")),
            RegistryError::InvalidDescription { .. }
        ));
    }

    #[test]
    fn context_menu_names_may_contain_spaces() {
        let definition = CommandDefinition::new("Show Avatar", "").kind(CommandKind::User);
        assert!(CommandRegistry::new(vec![decl(definition)], defaults()).is_ok());
    }

    #[test]
    fn required_options_come_first() {
        let definition = CommandDefinition::new("play", "Play")
            .add_option(OptionNode::new(OptionKind::String, "source", "Source"))
            .add_option(OptionNode::new(OptionKind::String, "query", "Query").required(true));
        assert_eq!(
            rejects(definition),
            RegistryError::RequiredAfterOptional {
                command: "play".into(),
                option: "query".into()
            }
        );
    }

    #[test]
    fn constraints_must_fit_the_option_type() {
        let lengths_on_integer = CommandDefinition::new("volume", "Volume")
            .add_option(OptionNode::new(OptionKind::Integer, "number", "Volume").max_length(3));
        assert!(matches!(
            rejects(lengths_on_integer),
            RegistryError::MisplacedConstraint { constraint: "min/max lengths", .. }
        ));

        let channels_on_string = CommandDefinition::new("log", "Log").add_option(
            OptionNode::new(OptionKind::String, "target", "Target")
                .add_channel_type(ChannelKind::TEXT),
        );
        assert!(matches!(
            rejects(channels_on_string),
            RegistryError::MisplacedConstraint { constraint: "channel types", .. }
        ));

        let inverted = CommandDefinition::new("volume", "Volume").add_option(
            OptionNode::new(OptionKind::Integer, "number", "Volume")
                .min_value(10.0)
                .max_value(1.0),
        );
        assert!(matches!(rejects(inverted), RegistryError::InvalidRange { .. }));
    }

    #[test]
    fn option_names_are_unique_per_level() {
        let definition = CommandDefinition::new("play", "Play")
            .add_option(OptionNode::new(OptionKind::String, "query", "Query").required(true))
            .add_option(OptionNode::new(OptionKind::Integer, "query", "Position"));
        assert_eq!(
            rejects(definition),
            RegistryError::DuplicateOption {
                command: "play".into(),
                option: "query".into()
            }
        );

        let same_name_in_sibling_subcommands = CommandDefinition::new("config", "Config")
            .add_option(
                OptionNode::new(OptionKind::SubCommand, "prefix", "Prefix")
                    .add_sub_option(OptionNode::new(OptionKind::String, "value", "Value")),
            )
            .add_option(
                OptionNode::new(OptionKind::SubCommand, "locale", "Locale")
                    .add_sub_option(OptionNode::new(OptionKind::String, "value", "Value")),
            );
        assert!(CommandRegistry::new(vec![decl(same_name_in_sibling_subcommands)], defaults()).is_ok());
    }

    #[test]
    fn choice_names_are_unique_per_option() {
        let definition = CommandDefinition::new("play", "Play").add_option(
            OptionNode::new(OptionKind::String, "source", "Source")
                .add_choice(Choice::string("YouTube", "ytsearch"))
                .add_choice(Choice::string("YouTube", "ytmsearch")),
        );
        assert_eq!(
            rejects(definition),
            RegistryError::DuplicateChoice {
                command: "play".into(),
                option: "source".into(),
                choice: "YouTube".into()
            }
        );
    }

    #[test]
    fn integer_bounds_must_be_whole_and_non_negative() {
        let bounded = |min: f64| {
            CommandDefinition::new("seek", "Seek").add_option(
                OptionNode::new(OptionKind::Integer, "seconds", "Seconds").min_value(min),
            )
        };
        assert!(matches!(rejects(bounded(1.5)), RegistryError::InvalidRange { .. }));
        assert!(matches!(rejects(bounded(-1.0)), RegistryError::InvalidRange { .. }));
        assert!(CommandRegistry::new(vec![decl(bounded(0.0))], defaults()).is_ok());

        let fractional_number = CommandDefinition::new("speed", "Speed").add_option(
            OptionNode::new(OptionKind::Number, "rate", "Rate").min_value(0.5),
        );
        assert!(CommandRegistry::new(vec![decl(fractional_number)], defaults()).is_ok());
    }

    #[test]
    fn integer_choices_must_fit_32_bits() {
        let definition = CommandDefinition::new("volume", "Volume").add_option(
            OptionNode::new(OptionKind::Integer, "number", "Volume")
                .add_choice(Choice::integer("huge", i64::from(i32::MAX) + 1)),
        );
        assert!(matches!(
            rejects(definition),
            RegistryError::ChoiceOutOfRange { .. }
        ));
    }

    #[test]
    fn too_many_choices_are_rejected() {
        let mut option = OptionNode::new(OptionKind::String, "source", "Source");
        for i in 0..26 {
            option = option.add_choice(Choice::string(format!("s{}", i), format!("s{}", i)));
        }
        let definition = CommandDefinition::new("play", "Play").add_option(option);
        assert!(matches!(rejects(definition), RegistryError::TooManyChoices { .. }));
    }

    #[test]
    fn subcommands_cannot_mix_with_plain_options() {
        let definition = CommandDefinition::new("config", "Config")
            .add_option(OptionNode::new(OptionKind::SubCommand, "show", "Show"))
            .add_option(OptionNode::new(OptionKind::String, "key", "Key"));
        assert!(matches!(rejects(definition), RegistryError::InvalidNesting { .. }));
    }

    #[test]
    fn groups_only_hold_subcommands_and_only_at_top_level() {
        let valid = CommandDefinition::new("config", "Config").add_option(
            OptionNode::new(OptionKind::SubCommandGroup, "prefix", "Prefix").add_sub_option(
                OptionNode::new(OptionKind::SubCommand, "set", "Set")
                    .add_sub_option(OptionNode::new(OptionKind::String, "value", "Value")),
            ),
        );
        assert!(CommandRegistry::new(vec![decl(valid)], defaults()).is_ok());

        let nested_group = CommandDefinition::new("config", "Config").add_option(
            OptionNode::new(OptionKind::SubCommand, "prefix", "Prefix").add_sub_option(
                OptionNode::new(OptionKind::SubCommandGroup, "set", "Set"),
            ),
        );
        assert!(matches!(rejects(nested_group), RegistryError::InvalidNesting { .. }));

        let too_many = (0..26).fold(CommandDefinition::new("many", "Many"), |definition, i| {
            definition.add_option(OptionNode::new(OptionKind::String, format!("o{}", i), "Option"))
        });
        assert!(matches!(rejects(too_many), RegistryError::TooManyOptions { .. }));
    }
}
