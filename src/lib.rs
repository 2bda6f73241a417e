#![allow(async_fn_in_trait)]

#[macro_use]
extern crate serde;

use mongodb::{Client, Database};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::error::{BackendError, ConfigurationError};

pub mod config;
pub mod data;
pub mod error;
pub mod markdown;
pub mod util;

/// Connects to the classroom store and provisions the uniqueness indexes the
/// schema relies on. The returned [`Database`] handle is what all of the
/// data layer extension traits hang off of.
pub async fn create(log_level: Option<Level>) -> Result<Database, BackendError> {
    if let Some(l) = log_level {
        let subscriber = FmtSubscriber::builder().with_max_level(l).finish();

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set global logger: {}", err);
        };
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            c
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };

    tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
    let client = Client::with_uri_str(c.mongodb_uri.as_str())
        .await
        .map_err(BackendError::Database)?;

    tracing::info!("Using MongoDB database: {}", c.mongodb_db);
    let db = client.database(c.mongodb_db.as_str());

    if let Err(e) = db.list_collection_names(None).await {
        tracing::error!("Unable to connect to MongoDB.");
        return Err(BackendError::Database(e));
    }

    tracing::info!("Provisioning schema indexes...");
    data::ensure_indexes(&db).await?;

    Ok(db)
}
