//! Per-guild settings, stored in the `Guilds` collection.

use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use serenity::all::{Guild, GuildId, UserId};
use tracing::{debug, info};

use super::StoreError;

const COLLECTION: &str = "Guilds";
const DUPLICATE_KEY: i32 = 11000;
/// Documents read per round trip by [`GuildStore::fetch_all`].
const PAGE_SIZE: i64 = 200;

/// Stored settings of one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildSettings {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    pub joined_at: DateTime,
    #[serde(default)]
    pub left_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl GuildSettings {
    pub fn new(
        id: GuildId,
        name: impl Into<String>,
        owner_id: UserId,
        joined_at: DateTime,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: id.to_string(),
            name: name.into(),
            owner_id: owner_id.to_string(),
            locale: None,
            prefix: None,
            joined_at,
            left_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn prefix_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.prefix.as_deref().unwrap_or(default)
    }

    pub fn locale_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.locale.as_deref().unwrap_or(default)
    }
}

/// CRUD over the `Guilds` collection.
#[derive(Clone)]
pub struct GuildStore {
    collection: Collection<GuildSettings>,
    default_prefix: String,
    default_locale: String,
}

impl GuildStore {
    pub fn new(db: &Database, default_prefix: &str, default_locale: &str) -> Self {
        Self {
            collection: db.collection(COLLECTION),
            default_prefix: default_prefix.to_string(),
            default_locale: default_locale.to_string(),
        }
    }

    /// Fresh, unsaved settings for a guild from the cache, carrying the configured defaults.
    pub fn settings_for(&self, guild: &Guild) -> GuildSettings {
        let joined_at = DateTime::from_millis(guild.joined_at.unix_timestamp() * 1000);
        let mut settings = GuildSettings::new(guild.id, &guild.name, guild.owner_id, joined_at);
        settings.prefix = Some(self.default_prefix.clone());
        settings.locale = Some(self.default_locale.clone());
        settings
    }

    pub async fn get(&self, id: GuildId) -> Result<Option<GuildSettings>, StoreError> {
        self.find(&id.to_string()).await
    }

    async fn find(&self, id: &str) -> Result<Option<GuildSettings>, StoreError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn create(&self, settings: GuildSettings) -> Result<GuildSettings, StoreError> {
        match self.collection.insert_one(&settings).await {
            Ok(_) => {
                info!("Stored settings for guild {} ({})", settings.name, settings.id);
                Ok(settings)
            }
            Err(e) if is_duplicate_key(&e) => Err(StoreError::AlreadyExists(settings.id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Stored settings of the guild, inserting `fresh` when there are none yet.
    pub async fn get_or_create(&self, fresh: GuildSettings) -> Result<GuildSettings, StoreError> {
        if let Some(existing) = self.find(&fresh.id).await? {
            return Ok(existing);
        }

        match self.create(fresh).await {
            // Lost an insert race with another handler.
            Err(StoreError::AlreadyExists(id)) => {
                self.find(&id).await?.ok_or(StoreError::NotFound(id))
            }
            other => other,
        }
    }

    /// Every stored document, read in pages ordered by id.
    pub async fn fetch_all(&self) -> Result<Vec<GuildSettings>, StoreError> {
        let mut all: Vec<GuildSettings> = Vec::new();
        loop {
            let filter = match all.last() {
                Some(last) => doc! { "_id": { "$gt": last.id.clone() } },
                None => doc! {},
            };
            let page: Vec<GuildSettings> = self
                .collection
                .find(filter)
                .sort(doc! { "_id": 1 })
                .limit(PAGE_SIZE)
                .await?
                .try_collect()
                .await?;
            let last_page = (page.len() as i64) < PAGE_SIZE;
            all.extend(page);
            if last_page {
                return Ok(all);
            }
        }
    }

    pub async fn set_prefix(&self, id: GuildId, prefix: &str) -> Result<(), StoreError> {
        self.set(id, doc! { "prefix": prefix }).await
    }

    pub async fn set_locale(&self, id: GuildId, locale: &str) -> Result<(), StoreError> {
        self.set(id, doc! { "locale": locale }).await
    }

    pub async fn mark_left(&self, id: GuildId) -> Result<(), StoreError> {
        self.set(id, doc! { "leftAt": DateTime::now() }).await
    }

    /// The bot was added back to a guild it had left.
    pub async fn mark_rejoined(&self, id: GuildId, joined_at: DateTime) -> Result<(), StoreError> {
        self.set(id, doc! { "joinedAt": joined_at, "leftAt": null }).await
    }

    pub async fn delete(&self, id: GuildId) -> Result<(), StoreError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() })
            .await?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!("Deleted settings of guild {}", id);
        Ok(())
    }

    async fn set(&self, id: GuildId, mut fields: mongodb::bson::Document) -> Result<(), StoreError> {
        fields.insert("updatedAt", DateTime::now());
        let result = self
            .collection
            .update_one(doc! { "_id": id.to_string() }, doc! { "$set": fields })
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}
