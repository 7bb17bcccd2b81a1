//! # belfry-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ScheduleStore` port defined in `belfry-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Store each top-level document key as one JSON row
//!
//! ## Dependency rule
//! Depends on `belfry-app` (for port traits) and `belfry-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod document_store;
pub mod error;
pub mod pool;

pub use document_store::SqliteScheduleStore;
pub use pool::Database;
