//! Scoped transactions.
//!
//! A [`Session`] is opened per unit of work and never shared. It ends in
//! exactly one of three ways:
//! - `release(true)` commits;
//! - `release(false)` rolls back;
//! - dropping it unreleased (early `?` return, cancelled future) rolls back.

use crudkit_core::managed::ManagedResource;
use crudkit_data::DataError;
use sqlx::Transaction;
use std::ops::{Deref, DerefMut};

use crate::error::SqlxErrorExt;
use crate::{Db, DbConnection, DbPool};

/// Trait for states that contain a database pool.
///
/// Implement this for your own state so that [`Session`] can be acquired
/// from it through [`ManagedResource`]:
///
/// ```ignore
/// impl HasPool for AppState {
///     fn pool(&self) -> &DbPool {
///         self.manager.pool()
///     }
/// }
/// ```
pub trait HasPool {
    fn pool(&self) -> &DbPool;
}

/// A wrapper around a SQLx [`Transaction`] on the active driver.
pub struct Session(Transaction<'static, Db>);

impl Session {
    /// Begin a transaction on a pooled connection.
    pub async fn begin(pool: &DbPool) -> Result<Self, DataError> {
        let tx = pool.begin().await.map_err(SqlxErrorExt::into_data_error)?;
        Ok(Session(tx))
    }

    /// The connection the transaction runs on, usable as a sqlx executor.
    pub fn conn(&mut self) -> &mut DbConnection {
        &mut self.0
    }

    /// Commit on `success`, roll back otherwise.
    pub async fn release(self, success: bool) -> Result<(), DataError> {
        if success {
            self.0.commit().await.map_err(SqlxErrorExt::into_data_error)
        } else {
            tracing::warn!("Rolling back session");
            self.0.rollback().await.map_err(SqlxErrorExt::into_data_error)
        }
    }
}

impl Deref for Session {
    type Target = Transaction<'static, Db>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// `ManagedResource` implementation for `Session`, handles the transaction lifecycle.
///
/// - `acquire`: begins a new transaction from the pool
/// - `release(true)`: commits the transaction
/// - `release(false)`: rolls the transaction back
impl<S> ManagedResource<S> for Session
where
    S: HasPool + Send + Sync,
{
    type Error = DataError;

    async fn acquire(state: &S) -> Result<Self, Self::Error> {
        Session::begin(state.pool()).await
    }

    async fn release(self, success: bool) -> Result<(), Self::Error> {
        Session::release(self, success).await
    }
}
