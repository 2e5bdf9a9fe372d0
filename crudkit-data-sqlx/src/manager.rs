use crudkit_core::managed::run_managed;
use crudkit_data::schema::create_table_sql;
use crudkit_data::{DataError, Entity, TableDef};
use sqlx::pool::PoolOptions;

use crate::config::DatabaseConfig;
use crate::crud::CrudRepository;
use crate::error::SqlxErrorExt;
use crate::lock::{LockGranularity, LockRegistry};
use crate::session::{HasPool, Session};
use crate::{Db, DbPool, DIALECT};

/// Owner of the connection pool and the write-lock registry.
///
/// Cloning is cheap: clones share the pool and the locks. Pass it to
/// repositories and tools explicitly.
///
/// ```ignore
/// let config = CrudkitConfig::load("dev")?.with_typed::<DatabaseConfig>()?;
/// let manager = ConnectionManager::configure(&config)?;
/// manager.init_schema(&[TestRecord::table_def()]).await?;
/// // ...
/// manager.close().await;
/// ```
#[derive(Clone, Debug)]
pub struct ConnectionManager {
    pool: DbPool,
    locks: LockRegistry,
}

impl ConnectionManager {
    /// Build a lazily connecting pool from `config`.
    ///
    /// No connection is opened here; an unreachable server shows up on first
    /// use. Must be called within a Tokio runtime.
    pub fn configure(config: &DatabaseConfig) -> Result<Self, DataError> {
        let url = config.url();
        let mut options = PoolOptions::<Db>::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.pool_timeout);

        // every connection to `:memory:` opens a separate empty database
        if is_in_memory(&url) {
            tracing::debug!("In-memory SQLite, limiting pool to one connection");
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options
            .connect_lazy(&url)
            .map_err(SqlxErrorExt::into_data_error)?;

        tracing::info!(
            url = %config.redacted_url(),
            max_connections = config.max_connections(),
            locks = %config.lock_granularity,
            "Connection pool configured"
        );
        Ok(Self::with_pool(pool, config.lock_granularity))
    }

    /// Wrap an existing pool.
    pub fn with_pool(pool: DbPool, granularity: LockGranularity) -> Self {
        Self {
            pool,
            locks: LockRegistry::new(granularity),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// Create the tables of `tables` that do not exist yet, in one session.
    ///
    /// Every failure is reported as `DataError::Schema`.
    pub async fn init_schema(&self, tables: &[TableDef]) -> Result<(), DataError> {
        let statements = tables
            .iter()
            .map(|table| create_table_sql(table, DIALECT))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DataError::Schema(e.to_string()))?;

        run_managed::<_, Session, (), DataError, _>(self, move |session| {
            Box::pin(async move {
                for ddl in &statements {
                    tracing::debug!(sql = %ddl, "Applying DDL");
                    sqlx::query::<Db>(ddl)
                        .execute(session.conn())
                        .await
                        .map_err(|e| DataError::Schema(e.to_string()))?;
                }
                Ok(())
            })
        })
        .await
        .map_err(|e| match e {
            DataError::Schema(_) => e,
            other => DataError::Schema(other.to_string()),
        })?;

        tracing::info!(
            tables = ?tables.iter().map(|t| t.name).collect::<Vec<_>>(),
            "Schema initialized"
        );
        Ok(())
    }

    /// Begin a transaction. Release it with [`Session::release`].
    pub async fn open_session(&self) -> Result<Session, DataError> {
        Session::begin(&self.pool).await
    }

    /// Type-level CRUD operations for `E`.
    pub fn repository<E: Entity>(&self) -> CrudRepository<E> {
        CrudRepository::new(self.clone())
    }

    /// Close the pool: wait for checked-out connections to return and close
    /// them all. Later operations fail with a persistence error.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

impl HasPool for ConnectionManager {
    fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:db?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite://app.db"));
        assert!(!is_in_memory("postgres://localhost/memory"));
    }
}
