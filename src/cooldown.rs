//! Per-command, per-user cooldowns.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serenity::all::UserId;

/// Tracks the last use of each command by each user.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    uses: Mutex<HashMap<String, HashMap<UserId, Instant>>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining cooldown of `user` for `command`, or `None` after recording this use.
    pub fn check(&self, command: &str, user: UserId, cooldown: Duration) -> Option<Duration> {
        self.check_at(command, user, cooldown, Instant::now())
    }

    pub fn check_at(
        &self,
        command: &str,
        user: UserId,
        cooldown: Duration,
        now: Instant,
    ) -> Option<Duration> {
        if cooldown.is_zero() {
            return None;
        }

        let mut uses = self.uses.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let users = uses.entry(command.to_string()).or_default();

        if let Some(last) = users.get(&user) {
            let expires = *last + cooldown;
            if now < expires {
                return Some(expires - now);
            }
        }

        users.retain(|_, last| now.saturating_duration_since(*last) < cooldown);
        users.insert(user, now);
        None
    }

    #[cfg(test)]
    fn tracked(&self, command: &str) -> usize {
        let uses = self.uses.lock().unwrap();
        uses.get(command).map_or(0, HashMap::len)
    }
}
