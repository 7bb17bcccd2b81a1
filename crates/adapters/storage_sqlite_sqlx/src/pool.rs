//! Opening the `SQLite` document database.
//!
//! Opening always applies the embedded migrations, so a fresh file and one
//! left by an older build end up with the same schema.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};

use crate::document_store::SqliteScheduleStore;
use crate::error::StorageError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Pooled connection limit.
const MAX_CONNECTIONS: u32 = 4;

/// An open, migrated `SQLite` database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database at `url` (`sqlite:belfry.db`, `sqlite::memory:`, …),
    /// creating the file if it does not exist yet.
    ///
    /// Every commit is synced to disk before it returns, so a document
    /// written just before a power cut is still there on reboot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is invalid, the connection fails
    /// or a migration cannot be applied.
    pub async fn open(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Full);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;
        tracing::debug!(url, migrations = MIGRATOR.iter().count(), "database ready");

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Schedule store sharing this pool.
    #[must_use]
    pub fn schedule_store(&self) -> SqliteScheduleStore {
        SqliteScheduleStore::new(self.pool.clone())
    }
}
