//! Fetch, diff and reconcile.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use serenity::all::GuildId;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::detect::has_changed;
use super::fetch::fetch_commands;
use super::{CommandPlatform, LocalCommand, PlatformError, RegisteredCommand, Scope, SyncError};

/// How a pass pushes local state to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Per-command create/edit/delete, only where drift was detected.
    Reconcile,
    /// Bulk-replace each scope that has local commands.
    Overwrite,
}

/// The single action chosen for one local/registered pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncAction<'a> {
    Add(&'a LocalCommand),
    Delete(&'a RegisteredCommand),
    /// Scope flipped: delete from the old scope, then create in the new one.
    Migrate {
        old: &'a RegisteredCommand,
        new: &'a LocalCommand,
    },
    Update {
        old: &'a RegisteredCommand,
        new: &'a LocalCommand,
    },
}

/// Outcome counters of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub migrated: usize,
    pub unchanged: usize,
    pub overwritten: usize,
    pub failed: usize,
}

impl SyncReport {
    /// Number of mutating platform operations that succeeded.
    pub fn mutations(&self) -> usize {
        self.added + self.updated + self.deleted + self.migrated + self.overwritten
    }
}

/// Decide what to do for every command, without touching the platform.
///
/// A local command is paired with the registered command of the same name, preferring
/// one in its own scope. Registered commands left unpaired are deleted, which also
/// removes a same-named leftover in the other scope.
pub fn plan<'a>(
    registered: &'a [RegisteredCommand],
    local: &'a [LocalCommand],
) -> Vec<SyncAction<'a>> {
    let mut pairs = Vec::with_capacity(local.len());
    let mut claimed = HashSet::new();

    for new in local {
        let same_scope = registered
            .iter()
            .position(|old| old.name() == new.name() && old.global == new.global);
        let any_scope = || registered.iter().position(|old| old.name() == new.name());

        let old = same_scope.or_else(any_scope);
        if let Some(index) = old {
            claimed.insert(index);
        }
        pairs.push((new, old.map(|index| &registered[index])));
    }

    let mut actions: Vec<SyncAction<'a>> = registered
        .iter()
        .enumerate()
        .filter(|(index, _)| !claimed.contains(index))
        .map(|(_, old)| SyncAction::Delete(old))
        .collect();

    for (new, old) in pairs {
        match old {
            None => actions.push(SyncAction::Add(new)),
            Some(old) if old.global != new.global => actions.push(SyncAction::Migrate { old, new }),
            Some(old) if has_changed(old, new) => actions.push(SyncAction::Update { old, new }),
            Some(_) => {}
        }
    }

    actions
}

/// Reconciles platform commands with the local registry.
///
/// Not re-entrant: a pass started while another is in flight fails with
/// [`SyncError::AlreadyRunning`].
pub struct Synchronizer<P> {
    platform: P,
    guild_id: GuildId,
    strategy: SyncStrategy,
    request_timeout: Duration,
    running: Mutex<()>,
}

impl<P: CommandPlatform> Synchronizer<P> {
    pub fn new(
        platform: P,
        guild_id: GuildId,
        strategy: SyncStrategy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            platform,
            guild_id,
            strategy,
            request_timeout,
            running: Mutex::new(()),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Run one synchronization pass.
    ///
    /// A failed fetch aborts the pass before any mutating call. Individual
    /// create/edit/delete failures are logged and counted without stopping the pass.
    pub async fn run(&self, local: &[LocalCommand]) -> Result<SyncReport, SyncError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        info!("Synchronizing application commands...");

        let registered = match fetch_commands(&self.platform, self.guild_id, self.request_timeout).await {
            Ok(registered) => registered,
            Err(e) => {
                error!("Aborting command synchronization: {}", e);
                return Err(e);
            }
        };

        let report = if self.strategy == SyncStrategy::Overwrite || registered.is_empty() {
            self.overwrite(local).await
        } else {
            self.reconcile(&registered, local).await
        };

        info!(
            "Application commands synchronized: {} added, {} updated, {} deleted, {} migrated, {} unchanged, {} overwritten, {} failed",
            report.added,
            report.updated,
            report.deleted,
            report.migrated,
            report.unchanged,
            report.overwritten,
            report.failed
        );

        Ok(report)
    }

    async fn reconcile(&self, registered: &[RegisteredCommand], local: &[LocalCommand]) -> SyncReport {
        let actions = plan(registered, local);
        let mut report = SyncReport {
            unchanged: local.len()
                - actions
                    .iter()
                    .filter(|action| !matches!(action, SyncAction::Delete(_)))
                    .count(),
            ..SyncReport::default()
        };

        for action in actions {
            match action {
                SyncAction::Delete(old) => {
                    let scope = self.scope_of(old.global);
                    match self.delete(old, scope).await {
                        Ok(()) => {
                            info!("DELETED command {} ({})", old.name(), scope);
                            report.deleted += 1;
                        }
                        Err(e) => {
                            error!("Failed to delete command {}: {}", old.name(), e);
                            report.failed += 1;
                        }
                    }
                }
                SyncAction::Add(new) => {
                    let scope = self.scope_of(new.global);
                    match self.create(new, scope).await {
                        Ok(()) => {
                            info!("ADDED command {} ({})", new.name(), scope);
                            report.added += 1;
                        }
                        Err(e) => {
                            error!("Failed to add command {}: {}", new.name(), e);
                            report.failed += 1;
                        }
                    }
                }
                SyncAction::Migrate { old, new } => {
                    let from = self.scope_of(old.global);
                    let to = self.scope_of(new.global);
                    if let Err(e) = self.delete(old, from).await {
                        error!(
                            "Failed to remove command {} from {} before moving it: {}",
                            old.name(),
                            from,
                            e
                        );
                        report.failed += 1;
                        continue;
                    }
                    match self.create(new, to).await {
                        Ok(()) => {
                            info!("MIGRATED command {} (scope changed from {} to {})", new.name(), from, to);
                            report.migrated += 1;
                        }
                        Err(e) => {
                            error!("Failed to recreate command {} in {}: {}", new.name(), to, e);
                            report.failed += 1;
                        }
                    }
                }
                SyncAction::Update { old, new } => {
                    let scope = self.scope_of(old.global);
                    let operation = format!("editing command {} ({})", new.name(), scope);
                    let result = self
                        .call(operation, self.platform.edit_command(old.id, new, scope))
                        .await;
                    match result {
                        Ok(()) => {
                            info!("UPDATED command {} ({})", new.name(), scope);
                            report.updated += 1;
                        }
                        Err(e) => {
                            error!("Failed to update command {}: {}", new.name(), e);
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        report
    }

    async fn overwrite(&self, local: &[LocalCommand]) -> SyncReport {
        let mut report = SyncReport::default();
        let (global, guild): (Vec<LocalCommand>, Vec<LocalCommand>) =
            local.iter().cloned().partition(|command| command.global);

        for (commands, scope) in [(guild, Scope::Guild(self.guild_id)), (global, Scope::Global)] {
            if commands.is_empty() {
                continue;
            }

            let operation = format!("overwriting {} commands", scope);
            match self
                .call(operation, self.platform.set_commands(&commands, scope))
                .await
            {
                Ok(()) => {
                    info!("Overwrote {} commands with {} definitions", scope, commands.len());
                    report.overwritten += commands.len();
                }
                Err(e) => {
                    error!("Failed to overwrite {} commands: {}", scope, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn create(&self, command: &LocalCommand, scope: Scope) -> Result<(), SyncError> {
        let operation = format!("creating command {} ({})", command.name(), scope);
        self.call(operation, self.platform.create_command(command, scope))
            .await
    }

    async fn delete(&self, command: &RegisteredCommand, scope: Scope) -> Result<(), SyncError> {
        let operation = format!("deleting command {} ({})", command.name(), scope);
        self.call(operation, self.platform.delete_command(command.id, scope))
            .await
    }

    async fn call<T>(
        &self,
        operation: String,
        request: impl Future<Output = Result<T, PlatformError>>,
    ) -> Result<T, SyncError> {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(SyncError::Rejected { operation, source }),
            Err(_) => {
                warn!("{} timed out", operation);
                Err(SyncError::Timeout {
                    operation,
                    timeout: self.request_timeout,
                })
            }
        }
    }

    fn scope_of(&self, global: bool) -> Scope {
        Scope::resolve(global, self.guild_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sync::fake::{FakePlatform, Op};
    use crate::sync::{CommandDefinition, OptionKind, OptionNode};

    const GUILD: GuildId = GuildId::new(42);

    fn command(name: &str, description: &str, global: bool) -> LocalCommand {
        LocalCommand {
            definition: CommandDefinition::new(name, description),
            global,
        }
    }

    fn synchronizer(platform: FakePlatform, strategy: SyncStrategy) -> Synchronizer<FakePlatform> {
        Synchronizer::new(platform, GUILD, strategy, Duration::from_secs(1))
    }

    #[test]
    fn plan_chooses_one_action_per_command() {
        let platform = FakePlatform::with_registered(&[
            command("stale", "Gone", true),
            command("ping", "Pong", false),
            command("moved", "Scope flips", false),
            command("same", "Unchanged", true),
        ]);
        let registered = platform.registered();
        let local = vec![
            command("ping", "Pong!", false),
            command("moved", "Scope flips", true),
            command("same", "Unchanged", true),
            command("fresh", "New", false),
        ];

        let actions = plan(&registered, &local);

        assert_eq!(actions.len(), 4);
        assert!(matches!(actions[0], SyncAction::Delete(old) if old.name() == "stale"));
        assert!(matches!(actions[1], SyncAction::Update { new, .. } if new.name() == "ping"));
        assert!(matches!(actions[2], SyncAction::Migrate { new, .. } if new.name() == "moved"));
        assert!(matches!(actions[3], SyncAction::Add(new) if new.name() == "fresh"));
    }

    #[test]
    fn plan_removes_leftover_in_other_scope() {
        let platform = FakePlatform::with_registered(&[
            command("ping", "Pong!", true),
            command("ping", "Pong!", false),
        ]);
        let registered = platform.registered();
        let local = vec![command("ping", "Pong!", true)];

        let actions = plan(&registered, &local);

        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], SyncAction::Delete(old) if !old.global));
    }

    #[tokio::test]
    async fn second_pass_is_a_no_op() {
        let platform = FakePlatform::with_registered(&[command("ping", "Pong", true)]);
        let sync = synchronizer(platform, SyncStrategy::Reconcile);
        let local = vec![
            command("ping", "Pong!", true),
            command("volume", "Change the volume", false),
        ];

        let first = sync.run(&local).await.unwrap();
        assert_eq!(first.updated, 1);
        assert_eq!(first.added, 1);

        sync.platform().clear_ops();
        let second = sync.run(&local).await.unwrap();
        assert_eq!(second.mutations(), 0);
        assert_eq!(second.unchanged, 2);
        assert!(sync.platform().ops().is_empty());
    }

    #[tokio::test]
    async fn scope_migration_deletes_then_creates() {
        let platform = FakePlatform::with_registered(&[command("play", "Play a song", false)]);
        let sync = synchronizer(platform, SyncStrategy::Reconcile);

        let report = sync.run(&[command("play", "Play a song", true)]).await.unwrap();

        assert_eq!(report.migrated, 1);
        let ops = sync.platform().ops();
        assert_eq!(
            ops,
            vec![
                Op::Delete("play".into(), Scope::Guild(GUILD)),
                Op::Create("play".into(), Scope::Global),
            ]
        );
        assert!(!ops.iter().any(|op| matches!(op, Op::Edit(..))));
    }

    #[tokio::test]
    async fn unknown_registered_commands_are_deleted_in_their_scope() {
        let platform = FakePlatform::with_registered(&[
            command("old-global", "Gone", true),
            command("old-guild", "Gone", false),
        ]);
        let sync = synchronizer(platform, SyncStrategy::Reconcile);

        let report = sync.run(&[command("ping", "Pong!", true)]).await.unwrap();

        assert_eq!(report.deleted, 2);
        let ops = sync.platform().ops();
        assert!(ops.contains(&Op::Delete("old-global".into(), Scope::Global)));
        assert!(ops.contains(&Op::Delete("old-guild".into(), Scope::Guild(GUILD))));
        assert!(ops.contains(&Op::Create("ping".into(), Scope::Global)));
    }

    #[tokio::test]
    async fn failed_operation_does_not_stop_the_pass() {
        let platform = FakePlatform::with_registered(&[command("keep", "Keep", true)]);
        platform.fail_on("broken");
        let sync = synchronizer(platform, SyncStrategy::Reconcile);

        let local = vec![
            command("keep", "Keep", true),
            command("broken", "Always rejected", true),
            command("fine", "Works", true),
        ];
        let report = sync.run(&local).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.added, 1);
        assert!(sync
            .platform()
            .ops()
            .contains(&Op::Create("fine".into(), Scope::Global)));
    }

    #[tokio::test]
    async fn failed_edit_does_not_stop_the_pass() {
        let platform = FakePlatform::with_registered(&[
            command("broken", "Old", true),
            command("fine", "Old", true),
        ]);
        platform.fail_on("broken");
        let sync = synchronizer(platform, SyncStrategy::Reconcile);

        let report = sync
            .run(&[command("broken", "New", true), command("fine", "New", true)])
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(sync.platform().ops(), vec![Op::Edit("fine".into(), Scope::Global)]);
        let broken = sync
            .platform()
            .registered()
            .into_iter()
            .find(|c| c.name() == "broken")
            .unwrap();
        assert_eq!(broken.definition.description, "Old");
    }

    #[tokio::test]
    async fn failed_delete_does_not_stop_the_pass() {
        let platform = FakePlatform::with_registered(&[
            command("stuck", "Gone", false),
            command("stale", "Gone", false),
            command("ping", "Pong", true),
        ]);
        platform.fail_on("stuck");
        let sync = synchronizer(platform, SyncStrategy::Reconcile);

        let report = sync
            .run(&[command("ping", "Pong!", true), command("fresh", "New", true)])
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.added, 1);
        let ops = sync.platform().ops();
        assert!(ops.contains(&Op::Delete("stale".into(), Scope::Guild(GUILD))));
        assert!(!ops.contains(&Op::Delete("stuck".into(), Scope::Guild(GUILD))));
        assert!(ops.contains(&Op::Create("fresh".into(), Scope::Global)));
    }

    #[tokio::test]
    async fn failed_migration_delete_skips_the_create() {
        let platform = FakePlatform::with_registered(&[
            command("play", "Play a song", false),
            command("queue", "Show the queue", false),
        ]);
        platform.fail_on("play");
        let sync = synchronizer(platform, SyncStrategy::Reconcile);

        let report = sync
            .run(&[
                command("play", "Play a song", true),
                command("queue", "Show the queue", true),
            ])
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.migrated, 1);
        let ops = sync.platform().ops();
        assert!(!ops.iter().any(|op| matches!(op, Op::Create(name, _) if name == "play")));
        assert!(ops.contains(&Op::Create("queue".into(), Scope::Global)));
        let play: Vec<_> = sync
            .platform()
            .registered()
            .into_iter()
            .filter(|c| c.name() == "play")
            .collect();
        assert_eq!(play.len(), 1);
        assert!(!play[0].global);
    }

    #[tokio::test]
    async fn failed_fetch_issues_no_mutations() {
        let platform = FakePlatform::with_registered(&[command("stale", "Gone", true)]);
        platform.set_unavailable(true);
        let sync = synchronizer(platform, SyncStrategy::Reconcile);

        let result = sync.run(&[command("ping", "Pong!", true)]).await;

        assert!(matches!(result, Err(SyncError::PlatformUnavailable { .. })));
        assert!(sync.platform().ops().is_empty());
    }

    #[tokio::test]
    async fn slow_platform_times_out() {
        let platform = FakePlatform::default();
        platform.set_delay(Duration::from_millis(200));
        let sync = Synchronizer::new(
            platform,
            GUILD,
            SyncStrategy::Reconcile,
            Duration::from_millis(10),
        );

        let result = sync.run(&[command("ping", "Pong!", true)]).await;

        assert!(matches!(result, Err(SyncError::Timeout { .. })));
    }

    #[tokio::test]
    async fn concurrent_pass_is_rejected() {
        let platform = FakePlatform::default();
        platform.set_delay(Duration::from_millis(50));
        let sync = Arc::new(synchronizer(platform, SyncStrategy::Reconcile));
        let local = vec![command("ping", "Pong!", true)];

        let (first, second) = tokio::join!(sync.run(&local), sync.run(&local));

        assert!(first.is_ok());
        assert!(matches!(second, Err(SyncError::AlreadyRunning)));
    }

    #[tokio::test]
    async fn overwrite_replaces_each_scope_in_one_request() {
        let platform = FakePlatform::with_registered(&[command("stale", "Gone", true)]);
        let sync = synchronizer(platform, SyncStrategy::Overwrite);
        let local = vec![
            command("ping", "Pong!", true),
            command("about", "About the bot", true),
            command("volume", "Change the volume", false),
        ];

        let report = sync.run(&local).await.unwrap();

        assert_eq!(report.overwritten, 3);
        assert_eq!(
            sync.platform().ops(),
            vec![Op::Set(1, Scope::Guild(GUILD)), Op::Set(2, Scope::Global)]
        );
    }

    #[tokio::test]
    async fn empty_baseline_uses_bulk_registration() {
        let sync = synchronizer(FakePlatform::default(), SyncStrategy::Reconcile);
        let local = vec![command("ping", "Pong!", true)];

        let report = sync.run(&local).await.unwrap();

        assert_eq!(report.overwritten, 1);
        assert_eq!(sync.platform().ops(), vec![Op::Set(1, Scope::Global)]);
    }

    #[tokio::test]
    async fn option_drift_triggers_edit_in_place() {
        let mut old = command("volume", "Change the volume", true);
        old.definition.options.push(OptionNode::new(OptionKind::Integer, "number", "Volume"));
        let platform = FakePlatform::with_registered(&[old.clone()]);
        let sync = synchronizer(platform, SyncStrategy::Reconcile);

        let mut new = old;
        new.definition.options[0].max_value = Some(200.0);
        let report = sync.run(&[new]).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(
            sync.platform().ops(),
            vec![Op::Edit("volume".into(), Scope::Global)]
        );
    }
}
