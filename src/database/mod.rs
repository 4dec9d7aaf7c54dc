//! MongoDB persistence.

mod guild;

pub use guild::{GuildSettings, GuildStore};

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("guild {0} has no stored settings")]
    NotFound(String),

    #[error("guild {0} already has stored settings")]
    AlreadyExists(String),
}

/// Connect to `uri` and make sure the server answers before the gateway starts.
pub async fn connect(uri: &str, database: &str) -> Result<Database, StoreError> {
    let mut options = ClientOptions::parse(uri).await?;
    options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

    let client = Client::with_options(options)?;
    let db = client.database(database);

    debug!("pinging mongodb: start");
    db.run_command(doc! { "ping": 1 }).await?;
    debug!("pinging mongodb: done");

    Ok(db)
}
