//! Storage-specific error type wrapping sqlx errors.

use belfry_domain::error::BelfryError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A stored value is not valid JSON.
    #[error("JSON error in document `{key}`")]
    Json {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for BelfryError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
