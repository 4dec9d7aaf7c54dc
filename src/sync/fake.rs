//! In-memory [`CommandPlatform`] used by the sync tests.

use std::sync::Mutex;
use std::time::Duration;

use serenity::all::{CommandId, GuildId};
use serenity::async_trait;

use super::{CommandPlatform, LocalCommand, PlatformError, RegisteredCommand, Scope};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Create(String, Scope),
    Edit(String, Scope),
    Delete(String, Scope),
    Set(usize, Scope),
}

#[derive(Default)]
pub struct FakePlatform {
    commands: Mutex<Vec<RegisteredCommand>>,
    ops: Mutex<Vec<Op>>,
    failing: Mutex<Vec<String>>,
    unavailable: Mutex<bool>,
    delay: Mutex<Option<Duration>>,
    next_id: Mutex<u64>,
}

impl FakePlatform {
    pub fn with_registered(commands: &[LocalCommand]) -> Self {
        let platform = Self::default();
        for command in commands {
            platform.insert(command);
        }
        platform
    }

    pub fn registered(&self) -> Vec<RegisteredCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Reject every mutating call for the named command.
    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().push(name.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    /// Delay applied to every fetch.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    fn insert(&self, command: &LocalCommand) {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.commands.lock().unwrap().push(RegisteredCommand {
            id: CommandId::new(*next_id),
            global: command.global,
            definition: command.definition.clone(),
        });
    }

    fn check(&self, name: &str) -> Result<(), PlatformError> {
        if self.failing.lock().unwrap().iter().any(|n| n == name) {
            return Err(PlatformError::Rejected(format!("{} rejected", name)));
        }
        Ok(())
    }

    async fn fetch(&self, global: bool) -> Result<Vec<RegisteredCommand>, PlatformError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.unavailable.lock().unwrap() {
            return Err(PlatformError::Rejected("503 Service Unavailable".into()));
        }
        Ok(self
            .commands
            .lock()
            .unwrap()
            .iter()
            .filter(|command| command.global == global)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CommandPlatform for FakePlatform {
    async fn fetch_global_commands(&self) -> Result<Vec<RegisteredCommand>, PlatformError> {
        self.fetch(true).await
    }

    async fn fetch_guild_commands(
        &self,
        _guild_id: GuildId,
    ) -> Result<Vec<RegisteredCommand>, PlatformError> {
        self.fetch(false).await
    }

    async fn create_command(
        &self,
        command: &LocalCommand,
        scope: Scope,
    ) -> Result<(), PlatformError> {
        self.check(command.name())?;
        self.ops
            .lock()
            .unwrap()
            .push(Op::Create(command.name().to_string(), scope));
        self.insert(&LocalCommand {
            definition: command.definition.clone(),
            global: scope.is_global(),
        });
        Ok(())
    }

    async fn edit_command(
        &self,
        id: CommandId,
        command: &LocalCommand,
        scope: Scope,
    ) -> Result<(), PlatformError> {
        self.check(command.name())?;
        self.ops
            .lock()
            .unwrap()
            .push(Op::Edit(command.name().to_string(), scope));
        let mut commands = self.commands.lock().unwrap();
        if let Some(existing) = commands.iter_mut().find(|c| c.id == id) {
            existing.definition = command.definition.clone();
        }
        Ok(())
    }

    async fn delete_command(&self, id: CommandId, scope: Scope) -> Result<(), PlatformError> {
        let mut commands = self.commands.lock().unwrap();
        let Some(index) = commands.iter().position(|c| c.id == id) else {
            return Err(PlatformError::Rejected("404 Unknown application command".into()));
        };
        self.check(commands[index].name())?;
        let removed = commands.remove(index);
        self.ops
            .lock()
            .unwrap()
            .push(Op::Delete(removed.name().to_string(), scope));
        Ok(())
    }

    async fn set_commands(
        &self,
        commands: &[LocalCommand],
        scope: Scope,
    ) -> Result<(), PlatformError> {
        self.ops.lock().unwrap().push(Op::Set(commands.len(), scope));
        self.commands
            .lock()
            .unwrap()
            .retain(|c| c.global != scope.is_global());
        for command in commands {
            self.insert(&LocalCommand {
                definition: command.definition.clone(),
                global: scope.is_global(),
            });
        }
        Ok(())
    }
}
