use thiserror::Error;

use crate::OrderId;

/// Errors that can occur when interacting with a record table.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for the key.
    #[error("Record not found in table {table}: {key}")]
    NotFound { table: String, key: OrderId },

    /// The configured table name is not a valid SQL identifier.
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

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

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
