//! Retrieves the currently registered command set.

use std::time::Duration;

use serenity::all::GuildId;
use tracing::{debug, info};

use super::{CommandPlatform, RegisteredCommand, Scope, SyncError};

/// Fetch global and guild commands, tagging each with the scope it came from.
///
/// Exactly one request per scope, no retries. Any failure fails the whole fetch so
/// callers never mistake an unreachable platform for an empty command set.
pub async fn fetch_commands<P>(
    platform: &P,
    guild_id: GuildId,
    timeout: Duration,
) -> Result<Vec<RegisteredCommand>, SyncError>
where
    P: CommandPlatform + ?Sized,
{
    debug!("Fetching global and guild commands");

    let global = tokio::time::timeout(timeout, platform.fetch_global_commands())
        .await
        .map_err(|_| SyncError::Timeout {
            operation: "fetching global commands".to_string(),
            timeout,
        })?
        .map_err(|source| SyncError::PlatformUnavailable {
            scope: Scope::Global,
            source,
        })?;

    let guild = tokio::time::timeout(timeout, platform.fetch_guild_commands(guild_id))
        .await
        .map_err(|_| SyncError::Timeout {
            operation: format!("fetching commands of guild {}", guild_id),
            timeout,
        })?
        .map_err(|source| SyncError::PlatformUnavailable {
            scope: Scope::Guild(guild_id),
            source,
        })?;

    info!(
        "Fetched {} commands ({} global, {} guild)",
        global.len() + guild.len(),
        global.len(),
        guild.len()
    );

    let commands = global
        .into_iter()
        .map(|command| RegisteredCommand {
            global: true,
            ..command
        })
        .chain(guild.into_iter().map(|command| RegisteredCommand {
            global: false,
            ..command
        }))
        .collect();

    Ok(commands)
}
