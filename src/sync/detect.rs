//! Structural diff between a registered command and its local definition.
//!
//! Children (options, choices) are matched by name, never by position.
//! Absent array fields are treated as empty sets and absent scalar
//! constraints as `0`/`false`, so an omitted value and its default never
//! count as drift.

use std::collections::HashSet;
use std::hash::Hash;

use super::model::{Choice, CommandKind, LocalCommand, Localizations, OptionNode, RegisteredCommand};

/// Returns `true` when `new` differs from `old` in any field the platform stores.
pub fn has_changed(old: &RegisteredCommand, new: &LocalCommand) -> bool {
    let old_def = &old.definition;
    let new_def = &new.definition;

    if localizations_changed(&old_def.name_localizations, &new_def.name_localizations) {
        return true;
    }

    if new_def.kind == CommandKind::ChatInput {
        if old_def.description != new_def.description {
            return true;
        }
        if localizations_changed(
            &old_def.description_localizations,
            &new_def.description_localizations,
        ) {
            return true;
        }
        if options_changed(&old_def.options, &new_def.options) {
            return true;
        }
    }

    if old_def.default_member_permissions != new_def.default_member_permissions {
        return true;
    }

    if old_def.nsfw != new_def.nsfw {
        return true;
    }

    // Only meaningful for global commands: guild commands are always guild-installed
    // and guild-invoked.
    if old.global || new.global {
        if sets_differ(&old_def.contexts, &new_def.contexts) {
            return true;
        }
        if sets_differ(&old_def.integration_types, &new_def.integration_types) {
            return true;
        }
    }

    false
}

/// Locale-by-locale comparison; a key present on one side only is a change.
pub fn localizations_changed(old: &Localizations, new: &Localizations) -> bool {
    old != new
}

/// Compares two option trees, matching each local option to the registered one of the
/// same name. Differing option counts are a change, which catches removed options.
pub fn options_changed(old: &[OptionNode], new: &[OptionNode]) -> bool {
    if old.len() != new.len() {
        return true;
    }

    new.iter().any(|new_option| {
        match old.iter().find(|option| option.name == new_option.name) {
            Some(old_option) => option_changed(old_option, new_option),
            None => true,
        }
    })
}

fn option_changed(old: &OptionNode, new: &OptionNode) -> bool {
    if localizations_changed(&old.name_localizations, &new.name_localizations) {
        return true;
    }
    if old.description != new.description {
        return true;
    }
    if localizations_changed(&old.description_localizations, &new.description_localizations) {
        return true;
    }

    if old.kind != new.kind
        || old.required != new.required
        || old.autocomplete != new.autocomplete
        || old.min_length.unwrap_or(0) != new.min_length.unwrap_or(0)
        || old.max_length.unwrap_or(0) != new.max_length.unwrap_or(0)
        || old.min_value.unwrap_or(0.0) != new.min_value.unwrap_or(0.0)
        || old.max_value.unwrap_or(0.0) != new.max_value.unwrap_or(0.0)
    {
        return true;
    }

    if choices_changed(&old.choices, &new.choices) {
        return true;
    }

    if sets_differ(&old.channel_types, &new.channel_types) {
        return true;
    }

    new.kind.is_subcommand() && options_changed(&old.options, &new.options)
}

/// Looks up every local choice among the registered ones. Registered choices with no
/// local counterpart are not inspected.
pub fn choices_changed(old: &[Choice], new: &[Choice]) -> bool {
    new.iter().any(|new_choice| {
        match old.iter().find(|choice| choice.name == new_choice.name) {
            Some(old_choice) => {
                old_choice.value != new_choice.value
                    || localizations_changed(
                        &old_choice.name_localizations,
                        &new_choice.name_localizations,
                    )
            }
            None => true,
        }
    })
}

fn sets_differ<T: Eq + Hash>(old: &[T], new: &[T]) -> bool {
    let old: HashSet<&T> = old.iter().collect();
    let new: HashSet<&T> = new.iter().collect();
    old != new
}

#[cfg(test)]
mod tests {
    use serenity::all::CommandId;

    use super::*;
    use crate::sync::model::{
        ChannelKind, ChoiceValue, CommandDefinition, ContextKind, IntegrationKind, OptionKind,
    };

    fn local(definition: CommandDefinition, global: bool) -> LocalCommand {
        LocalCommand { definition, global }
    }

    fn registered(definition: CommandDefinition, global: bool) -> RegisteredCommand {
        RegisteredCommand {
            id: CommandId::new(1),
            global,
            definition,
        }
    }

    fn volume() -> CommandDefinition {
        CommandDefinition::new("volume", "Change the volume").add_option(
            OptionNode::new(OptionKind::Integer, "number", "New volume")
                .min_value(0.0)
                .max_value(200.0),
        )
    }

    fn play() -> CommandDefinition {
        CommandDefinition::new("play", "Play a song")
            .add_option(OptionNode::new(OptionKind::String, "query", "Song").required(true))
            .add_option(
                OptionNode::new(OptionKind::String, "source", "Search source")
                    .add_choice(Choice::string("YouTube", "ytsearch"))
                    .add_choice(Choice::string("SoundCloud", "scsearch")),
            )
    }

    #[test]
    fn identical_commands_are_unchanged() {
        assert!(!has_changed(&registered(play(), true), &local(play(), true)));
    }

    #[test]
    fn description_change_is_detected() {
        let old = registered(CommandDefinition::new("ping", "Pong"), false);
        let new = local(CommandDefinition::new("ping", "Pong!"), false);
        assert!(has_changed(&old, &new));
    }

    #[test]
    fn description_is_ignored_for_context_menu_commands() {
        let old = registered(
            CommandDefinition::new("Grab", "").kind(CommandKind::Message),
            false,
        );
        let new = local(
            CommandDefinition::new("Grab", "ignored").kind(CommandKind::Message),
            false,
        );
        assert!(!has_changed(&old, &new));
    }

    #[test]
    fn absent_max_value_counts_as_zero() {
        let mut old_def = volume();
        old_def.options[0].max_value = None;
        assert!(has_changed(&registered(old_def, true), &local(volume(), true)));
    }

    #[test]
    fn explicit_zero_matches_absent_constraint() {
        let mut old_def = volume();
        old_def.options[0].min_value = None;
        assert!(!has_changed(&registered(old_def, true), &local(volume(), true)));
    }

    #[test]
    fn reordered_options_are_unchanged() {
        let mut reordered = play();
        reordered.options.reverse();
        assert!(!has_changed(&registered(play(), true), &local(reordered, true)));
    }

    #[test]
    fn option_type_change_at_same_name_is_detected() {
        let mut new_def = volume();
        new_def.options[0].kind = OptionKind::Number;
        assert!(has_changed(&registered(volume(), true), &local(new_def, true)));
    }

    #[test]
    fn new_and_removed_options_are_detected() {
        let mut added = volume();
        added.options.push(OptionNode::new(OptionKind::Boolean, "save", "Remember it"));
        assert!(has_changed(&registered(volume(), true), &local(added, true)));

        let mut removed = volume();
        removed.options.clear();
        assert!(has_changed(&registered(volume(), true), &local(removed, true)));
    }

    #[test]
    fn required_flag_change_is_detected() {
        let mut new_def = play();
        new_def.options[0].required = false;
        assert!(has_changed(&registered(play(), true), &local(new_def, true)));
    }

    #[test]
    fn choice_value_change_is_detected() {
        let mut new_def = play();
        new_def.options[1].choices[0].value = ChoiceValue::String("ytmsearch".into());
        assert!(has_changed(&registered(play(), true), &local(new_def, true)));
    }

    #[test]
    fn new_local_choice_is_detected() {
        let mut new_def = play();
        new_def.options[1]
            .choices
            .push(Choice::string("Deezer", "dzsearch"));
        assert!(has_changed(&registered(play(), true), &local(new_def, true)));
    }

    #[test]
    fn registered_only_choice_is_not_a_change() {
        let mut old_def = play();
        old_def.options[1]
            .choices
            .push(Choice::string("Deezer", "dzsearch"));
        assert!(!has_changed(&registered(old_def, true), &local(play(), true)));
    }

    #[test]
    fn choice_localization_change_is_detected() {
        let mut new_def = play();
        new_def.options[1].choices[0] =
            Choice::string("YouTube", "ytsearch").name_localized("pt-BR", "YouTube BR");
        assert!(has_changed(&registered(play(), true), &local(new_def, true)));
    }

    #[test]
    fn locale_present_on_one_side_only_is_a_change() {
        let old = registered(CommandDefinition::new("ping", "Pong!"), true);
        let new = local(
            CommandDefinition::new("ping", "Pong!").name_localized("fr", "ping"),
            true,
        );
        assert!(has_changed(&old, &new));

        let old = registered(
            CommandDefinition::new("ping", "Pong!").description_localized("fr", "Pong !"),
            true,
        );
        let new = local(CommandDefinition::new("ping", "Pong!"), true);
        assert!(has_changed(&old, &new));
    }

    #[test]
    fn permissions_and_nsfw_are_compared() {
        let old = registered(CommandDefinition::new("language", "Set language"), true);
        let new = local(
            CommandDefinition::new("language", "Set language").default_member_permissions(32),
            true,
        );
        assert!(has_changed(&old, &new));

        let new = local(CommandDefinition::new("language", "Set language").nsfw(true), true);
        assert!(has_changed(&old, &new));
    }

    #[test]
    fn contexts_compared_as_sets_for_global_commands() {
        let base = CommandDefinition::new("ping", "Pong!")
            .contexts([ContextKind::Guild, ContextKind::BotDm])
            .integration_types([IntegrationKind::GuildInstall]);

        let reordered = CommandDefinition::new("ping", "Pong!")
            .contexts([ContextKind::BotDm, ContextKind::Guild])
            .integration_types([IntegrationKind::GuildInstall]);
        assert!(!has_changed(&registered(base.clone(), true), &local(reordered, true)));

        let removed = CommandDefinition::new("ping", "Pong!")
            .contexts([ContextKind::Guild])
            .integration_types([IntegrationKind::GuildInstall]);
        assert!(has_changed(&registered(base.clone(), true), &local(removed, true)));

        let user_install = CommandDefinition::new("ping", "Pong!")
            .contexts([ContextKind::Guild, ContextKind::BotDm])
            .integration_types([IntegrationKind::GuildInstall, IntegrationKind::UserInstall]);
        assert!(has_changed(&registered(base, true), &local(user_install, true)));
    }

    #[test]
    fn contexts_ignored_for_guild_commands() {
        let old = registered(
            CommandDefinition::new("ping", "Pong!").contexts([ContextKind::Guild]),
            false,
        );
        let new = local(CommandDefinition::new("ping", "Pong!"), false);
        assert!(!has_changed(&old, &new));
    }

    #[test]
    fn absent_contexts_equal_empty_contexts() {
        let old = registered(CommandDefinition::new("ping", "Pong!"), true);
        let new = local(CommandDefinition::new("ping", "Pong!").contexts([]), true);
        assert!(!has_changed(&old, &new));

        let new = local(
            CommandDefinition::new("ping", "Pong!").contexts([ContextKind::Guild]),
            true,
        );
        assert!(has_changed(&old, &new));
    }

    #[test]
    fn channel_types_compared_as_sets() {
        let old_def = CommandDefinition::new("join", "Join a channel").add_option(
            OptionNode::new(OptionKind::Channel, "channel", "Voice channel")
                .add_channel_type(ChannelKind::VOICE)
                .add_channel_type(ChannelKind::STAGE),
        );
        let mut reordered = old_def.clone();
        reordered.options[0].channel_types.reverse();
        assert!(!has_changed(&registered(old_def.clone(), true), &local(reordered, true)));

        let mut narrowed = old_def.clone();
        narrowed.options[0].channel_types.pop();
        assert!(has_changed(&registered(old_def, true), &local(narrowed, true)));
    }

    #[test]
    fn nested_subcommand_options_are_compared() {
        let tree = |max: f64| {
            CommandDefinition::new("config", "Configure").add_option(
                OptionNode::new(OptionKind::SubCommandGroup, "player", "Player settings")
                    .add_sub_option(
                        OptionNode::new(OptionKind::SubCommand, "volume", "Default volume")
                            .add_sub_option(
                                OptionNode::new(OptionKind::Integer, "value", "Volume")
                                    .max_value(max),
                            ),
                    ),
            )
        };
        assert!(!has_changed(&registered(tree(100.0), true), &local(tree(100.0), true)));
        assert!(has_changed(&registered(tree(100.0), true), &local(tree(150.0), true)));
    }
}
