//! Application command synchronization.
//!
//! Reconciles the commands registered with Discord against the local command
//! registry, issuing only the create/edit/delete calls needed to remove drift.

mod detect;
#[cfg(test)]
mod fake;
mod fetch;
mod model;
mod platform;
mod synchronizer;

pub use detect::has_changed;
pub use fetch::fetch_commands;
pub use model::{
    ChannelKind, Choice, ChoiceValue, CommandDefinition, CommandKind, ContextKind,
    IntegrationKind, LocalCommand, OptionKind, OptionNode, RegisteredCommand, Scope,
};
pub use platform::SerenityPlatform;
pub use synchronizer::{plan, SyncAction, SyncReport, SyncStrategy, Synchronizer};

use std::time::Duration;

use serenity::all::{CommandId, GuildId};
use serenity::async_trait;
use thiserror::Error;

/// Failure reported by a [`CommandPlatform`] call.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error(transparent)]
    Serenity(#[from] serenity::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Failure of a whole synchronization pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("could not fetch {scope} commands: {source}")]
    PlatformUnavailable {
        scope: Scope,
        #[source]
        source: PlatformError,
    },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("{operation} failed: {source}")]
    Rejected {
        operation: String,
        #[source]
        source: PlatformError,
    },

    #[error("a command synchronization is already running")]
    AlreadyRunning,
}

/// Application command management endpoints of the chat platform.
#[async_trait]
pub trait CommandPlatform: Send + Sync {
    async fn fetch_global_commands(&self) -> Result<Vec<RegisteredCommand>, PlatformError>;

    async fn fetch_guild_commands(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<RegisteredCommand>, PlatformError>;

    async fn create_command(&self, command: &LocalCommand, scope: Scope)
        -> Result<(), PlatformError>;

    async fn edit_command(
        &self,
        id: CommandId,
        command: &LocalCommand,
        scope: Scope,
    ) -> Result<(), PlatformError>;

    async fn delete_command(&self, id: CommandId, scope: Scope) -> Result<(), PlatformError>;

    /// Replaces every command in `scope` with `commands` in a single request.
    async fn set_commands(&self, commands: &[LocalCommand], scope: Scope)
        -> Result<(), PlatformError>;
}
