//! `SQLite` implementation of [`ScheduleStore`].

use std::future::Future;

use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;

use belfry_app::ports::ScheduleStore;
use belfry_domain::book::DocumentKey;
use belfry_domain::error::BelfryError;
use serde_json::Value;

use crate::error::StorageError;

const SELECT_BY_KEY: &str = "SELECT value FROM documents WHERE key = ?";
const UPSERT: &str = "INSERT INTO documents (key, value, updated_at) VALUES (?, ?, ?) \
     ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";
const DELETE_BY_KEY: &str = "DELETE FROM documents WHERE key = ?";

fn decode(key: DocumentKey, raw: Option<String>) -> Result<Option<Value>, StorageError> {
    raw.map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(|source| StorageError::Json {
            key: key.as_str(),
            source,
        })
}

/// `SQLite`-backed schedule document store.
#[derive(Clone)]
pub struct SqliteScheduleStore {
    pool: SqlitePool,
}

impl SqliteScheduleStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn get(
        &self,
        key: DocumentKey,
    ) -> impl Future<Output = Result<Option<Value>, BelfryError>> + Send {
        let pool = self.pool.clone();
        async move {
            let raw: Option<String> = sqlx::query_scalar(SELECT_BY_KEY)
                .bind(key.as_str())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(decode(key, raw)?)
        }
    }

    fn set(
        &self,
        key: DocumentKey,
        value: Value,
    ) -> impl Future<Output = Result<(), BelfryError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPSERT)
                .bind(key.as_str())
                .bind(value.to_string())
                .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            tracing::trace!(%key, "document saved");
            Ok(())
        }
    }

    fn remove(
        &self,
        key: DocumentKey,
    ) -> impl Future<Output = Result<Option<Value>, BelfryError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            let raw: Option<String> = sqlx::query_scalar(SELECT_BY_KEY)
                .bind(key.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            sqlx::query(DELETE_BY_KEY)
                .bind(key.as_str())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            tx.commit().await.map_err(StorageError::from)?;

            Ok(decode(key, raw)?)
        }
    }
}
