use thiserror::Error;

use crate::{Collection, RecordId, Version};

/// Errors that can occur when interacting with the record store.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// An update expected a version that is no longer current.
    #[error(
        "Concurrency conflict for {collection} record {id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        collection: Collection,
        id: RecordId,
        expected: Version,
        actual: Version,
    },

    /// An update targeted a record that does not exist.
    #[error("Record not found: {collection} {id}")]
    NotFound { collection: Collection, id: RecordId },

    /// An insert reused an id that already exists in the collection.
    #[error("Duplicate id for {collection} record {id}")]
    DuplicateId { collection: Collection, id: RecordId },

    /// An insert would duplicate a unique field value.
    #[error("Unique constraint violated on {collection}.{field} = {value}")]
    UniqueViolation {
        collection: Collection,
        field: String,
        value: String,
    },

    /// The batch or one of its writes is malformed.
    #[error("Invalid write: {0}")]
    InvalidWrite(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecordStoreError {
    /// Returns true if re-reading and re-submitting the batch may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecordStoreError::ConcurrencyConflict { .. } | RecordStoreError::UniqueViolation { .. }
        )
    }
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, RecordStoreError>;
