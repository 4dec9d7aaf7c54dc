//! Bot state shared by every handler.

use std::time::Instant;

use lavalink_rs::client::LavalinkClient;

use crate::commands::CommandRegistry;
use crate::config::Config;
use crate::cooldown::CooldownTracker;
use crate::database::GuildStore;
use crate::sync::{SerenityPlatform, Synchronizer};

pub struct Data {
    pub config: Config,
    pub registry: CommandRegistry,
    pub cooldowns: CooldownTracker,
    pub guilds: GuildStore,
    pub lavalink: LavalinkClient,
    pub synchronizer: Synchronizer<SerenityPlatform>,
    pub started_at: Instant,
}
