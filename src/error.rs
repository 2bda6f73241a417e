use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration file not found in '{0}'")]
    NotFound(PathBuf),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A rejected write against the classroom store.
///
/// Constraint violations reject exactly the offending write; nothing is
/// retried or silently corrected.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {what}: {detail}")]
    Duplicate {
        what: &'static str,
        detail: &'static str,
    },
    #[error("{what} '{id}' does not exist")]
    MissingParent { what: &'static str, id: Uuid },
    #[error("{0}")]
    Validation(String),

    // External errors
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    Bson(#[from] bson::de::Error),
    #[error(transparent)]
    BsonSerialize(#[from] bson::ser::Error),
}

impl StoreError {
    #[inline]
    pub fn validation(detail: impl ToString) -> StoreError {
        StoreError::Validation(detail.to_string())
    }

    /// Maps a duplicate-key write rejection onto the constraint it violated;
    /// anything else stays a database error.
    pub(crate) fn write_conflict(
        e: mongodb::error::Error,
        what: &'static str,
        detail: &'static str,
    ) -> StoreError {
        if is_duplicate_key(&e) {
            StoreError::Duplicate { what, detail }
        } else {
            StoreError::Database(e)
        }
    }
}

// Server error code raised by unique index violations.
const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(bulk) => bulk
            .write_errors
            .iter()
            .flatten()
            .any(|write| write.code == DUPLICATE_KEY),
        _ => false,
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Store(#[from] StoreError),

    // External errors
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
