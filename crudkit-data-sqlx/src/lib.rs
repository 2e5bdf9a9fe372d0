//! # crudkit-data-sqlx: SQLx backend for the crudkit data layer
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-specific
//! pieces of crudkit. It depends on [`crudkit-data`] for the entity contract,
//! values and statement builders, and adds the connection handling, sessions,
//! locking and CRUD operations needed to talk to a real database.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DatabaseConfig`] | Typed `database.*` configuration section |
//! | [`ConnectionManager`] | Pool owner: `configure`, `init_schema`, `open_session`, `close` |
//! | [`Session`] | Scoped transaction, committed or rolled back on release |
//! | [`HasPool`] | Trait for states that can hand out a pool (sessions are acquired from it) |
//! | [`CrudRepository`] | Type-level operations: create, lookups, filtered listing, paging |
//! | [`CrudTool`] | Operations bound to one identifier: get, update, delete |
//! | [`LockRegistry`] | Async per-identifier (or per-entity) write locks |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//!
//! # Feature flags
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `sqlite`   | SQLite via `sqlx/sqlite` (default) |
//! | `postgres` | PostgreSQL via `sqlx/postgres` (wins when both are enabled) |
//!
//! # Quick start
//!
//! ```ignore
//! use crudkit_data_sqlx::prelude::*;
//!
//! let manager = ConnectionManager::configure(&DatabaseConfig::from_url("sqlite::memory:"))?;
//! manager.init_schema(&[TestRecord::table_def()]).await?;
//!
//! let repo = manager.repository::<TestRecord>();
//! let record = repo.create(FieldMap::new().with("status", "test").with("count", 1)).await?;
//! repo.tool(record.id).update(FieldMap::new().with("count", 2)).await?;
//!
//! manager.close().await;
//! ```
//!
//! # Error bridging
//!
//! Due to Rust's orphan rules, `From<sqlx::Error> for DataError` can't be
//! implemented here. Use the [`SqlxErrorExt`] trait instead:
//!
//! ```ignore
//! use crudkit_data_sqlx::SqlxErrorExt;
//!
//! let row = sqlx::query("SELECT ...")
//!     .fetch_one(manager.pool())
//!     .await
//!     .map_err(|e| e.into_data_error())?;
//! ```

mod bind;
pub mod config;
pub mod crud;
pub mod error;
pub mod lock;
pub mod manager;
pub mod session;

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("crudkit-data-sqlx needs a database driver: enable the `sqlite` or `postgres` feature");

/// The active database driver.
#[cfg(feature = "postgres")]
pub type Db = sqlx::Postgres;
#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type Db = sqlx::Sqlite;

/// SQL dialect matching [`Db`].
#[cfg(feature = "postgres")]
pub const DIALECT: crudkit_data::Dialect = crudkit_data::Dialect::Postgres;
#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub const DIALECT: crudkit_data::Dialect = crudkit_data::Dialect::Sqlite;

pub type DbPool = sqlx::Pool<Db>;
pub type DbRow = <Db as sqlx::Database>::Row;
pub type DbConnection = <Db as sqlx::Database>::Connection;

pub use config::DatabaseConfig;
pub use crud::{CrudRepository, CrudTool};
pub use error::SqlxErrorExt;
pub use lock::{LockGranularity, LockGuard, LockRegistry};
pub use manager::ConnectionManager;
pub use session::{HasPool, Session};

/// Re-exports of the most commonly used types from both `crudkit-data` and this crate.
pub mod prelude {
    pub use crate::{
        ConnectionManager, CrudRepository, CrudTool, DatabaseConfig, HasPool, LockGranularity,
        Session, SqlxErrorExt,
    };
    pub use crudkit_data::prelude::*;
}
