//! Generic CRUD operations over one entity type.
//!
//! [`CrudRepository`] holds the operations that are not bound to a row
//! (create, listing, paging, counting). [`CrudTool`] is bound to one
//! identifier and holds get / update / delete. Updates and deletes run under
//! the row's write lock from the [`LockRegistry`](crate::LockRegistry) for the
//! whole read-modify-write, inside one session.

use std::marker::PhantomData;

use crudkit_core::managed::run_managed;
use crudkit_data::validate::{prepare_filters, prepare_insert, prepare_update, Assignment};
use crudkit_data::{
    DataError, Entity, FieldMap, Filter, IdentifierPolicy, Page, Pageable, QueryBuilder,
    Repository,
};
use sqlx::FromRow;

use crate::bind::{self, DbArguments};
use crate::error::SqlxErrorExt;
use crate::manager::ConnectionManager;
use crate::session::Session;
use crate::{Db, DbRow, DIALECT};

fn entity_query<E: Entity>() -> QueryBuilder {
    QueryBuilder::new_with_dialect(E::table_name(), DIALECT).identifier_policy(IdentifierPolicy::Quote)
}

/// Type-level operations for entity `E`.
///
/// # Example
///
/// ```ignore
/// let repo = CrudRepository::<TestRecord>::new(manager.clone());
/// let record = repo.create(FieldMap::new().with("status", "test")).await?;
/// let matching = repo.get_all_with_filters(&[Filter::eq("status", "test")]).await?;
/// ```
pub struct CrudRepository<E> {
    manager: ConnectionManager,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> CrudRepository<E> {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            _marker: PhantomData,
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Create a `QueryBuilder` pre-configured for this entity's table,
    /// quoting every identifier.
    pub fn query(&self) -> QueryBuilder {
        entity_query::<E>()
    }

    /// Operations bound to the row `id`.
    pub fn tool(&self, id: E::Id) -> CrudTool<E> {
        CrudTool::new(id, self.manager.clone())
    }
}

impl<E> CrudRepository<E>
where
    E: Entity + for<'r> FromRow<'r, DbRow>,
{
    /// Validate `data`, fill declared defaults and insert one row.
    ///
    /// Returns the row as stored, with its generated identifier.
    pub async fn create(&self, data: FieldMap) -> Result<E, DataError> {
        let assignments = prepare_insert::<E>(data)?;
        let columns: Vec<&str> = assignments.iter().map(|(column, _)| column.name).collect();
        let sql = self.query().build_insert(&columns, &E::column_names())?;
        let args = bind::arguments(assignments.into_iter().map(|(column, value)| (column.ty, value)))?;

        let entity = run_managed::<_, Session, E, DataError, _>(&self.manager, move |session| {
            Box::pin(async move {
                sqlx::query_as_with::<Db, E, _>(&sql, args)
                    .fetch_one(session.conn())
                    .await
                    .map_err(SqlxErrorExt::into_data_error)
            })
        })
        .await?;

        tracing::debug!(table = E::table_name(), id = %entity.id(), "Created row");
        Ok(entity)
    }

    pub async fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, DataError> {
        self.tool(id.clone()).get().await
    }

    /// Every row, ordered by identifier. Unbounded.
    pub async fn get_all(&self) -> Result<Vec<E>, DataError> {
        self.get_all_with_filters(&[]).await
    }

    /// Rows matching every filter, ordered by identifier.
    pub async fn get_all_with_filters(&self, filters: &[Filter]) -> Result<Vec<E>, DataError> {
        let filters = prepare_filters::<E>(filters)?;
        let query = self
            .query()
            .filters(filters.clone())
            .order_by(E::id_column(), true);
        self.select(query, &filters).await
    }

    /// One page of the rows matching `filters`.
    ///
    /// Ordered by `pageable.sort` when given, by identifier otherwise.
    pub async fn find_page(&self, pageable: &Pageable, filters: &[Filter]) -> Result<Page<E>, DataError> {
        let (limit, offset) = pageable.bounds()?;
        let filters = prepare_filters::<E>(filters)?;
        let (order_column, ascending) = match pageable.sort_order() {
            Some((name, ascending)) => match E::column(name) {
                Some(column) => (column.name, ascending),
                None => return Err(DataError::invalid(name, "unknown sort field")),
            },
            None => (E::id_column(), true),
        };

        let total = self.count_checked(&filters).await?;
        let query = self
            .query()
            .filters(filters.clone())
            .order_by(order_column, ascending)
            .limit(limit)
            .offset(offset);
        let content = self.select(query, &filters).await?;
        Ok(Page::new(content, pageable, total))
    }

    /// Number of rows matching `filters`.
    pub async fn count(&self, filters: &[Filter]) -> Result<u64, DataError> {
        let filters = prepare_filters::<E>(filters)?;
        self.count_checked(&filters).await
    }

    async fn select(&self, query: QueryBuilder, filters: &[Filter]) -> Result<Vec<E>, DataError> {
        let (sql, params) = query.build_select(&E::column_names())?;
        let args = bind::arguments(bind::filter_params::<E>(filters, params))?;
        let rows = sqlx::query_as_with::<Db, E, _>(&sql, args)
            .fetch_all(self.manager.pool())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        tracing::debug!(table = E::table_name(), rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn count_checked(&self, filters: &[Filter]) -> Result<u64, DataError> {
        let (sql, params) = self.query().filters(filters.to_vec()).build_count()?;
        let args = bind::arguments(bind::filter_params::<E>(filters, params))?;
        let count: i64 = sqlx::query_scalar_with::<Db, i64, _>(&sql, args)
            .fetch_one(self.manager.pool())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

impl<E> Clone for CrudRepository<E> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E> Repository<E> for CrudRepository<E>
where
    E: Entity + for<'r> FromRow<'r, DbRow>,
{
    async fn create(&self, data: FieldMap) -> Result<E, DataError> {
        CrudRepository::create(self, data).await
    }

    async fn find_by_id(&self, id: &E::Id) -> Result<Option<E>, DataError> {
        CrudRepository::find_by_id(self, id).await
    }

    async fn find_all(&self) -> Result<Vec<E>, DataError> {
        self.get_all().await
    }

    async fn find_filtered(&self, filters: &[Filter]) -> Result<Vec<E>, DataError> {
        self.get_all_with_filters(filters).await
    }

    async fn find_page(&self, pageable: &Pageable, filters: &[Filter]) -> Result<Page<E>, DataError> {
        CrudRepository::find_page(self, pageable, filters).await
    }

    async fn update(&self, id: &E::Id, data: FieldMap) -> Result<(), DataError> {
        self.tool(id.clone()).update(data).await
    }

    async fn delete(&self, id: &E::Id) -> Result<(), DataError> {
        self.tool(id.clone()).delete().await
    }

    async fn count(&self, filters: &[Filter]) -> Result<u64, DataError> {
        CrudRepository::count(self, filters).await
    }
}

/// Operations on the single row identified by `id`.
///
/// Holds only the identifier and a manager handle; returned entities are
/// never cached.
pub struct CrudTool<E: Entity> {
    id: E::Id,
    manager: ConnectionManager,
}

impl<E: Entity> CrudTool<E> {
    pub fn new(id: E::Id, manager: ConnectionManager) -> Self {
        Self { id, manager }
    }

    pub fn id(&self) -> &E::Id {
        &self.id
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    fn query(&self) -> QueryBuilder {
        entity_query::<E>()
    }

    fn id_filter(&self) -> Vec<Filter> {
        vec![Filter::eq(E::id_column(), self.id.clone())]
    }

    fn select_statement(&self) -> Result<(String, DbArguments), DataError> {
        let filters = self.id_filter();
        let (sql, params) = self
            .query()
            .filters(filters.clone())
            .build_select(&E::column_names())?;
        let args = bind::arguments(bind::filter_params::<E>(&filters, params))?;
        Ok((sql, args))
    }

    fn not_found(&self) -> DataError {
        DataError::not_found(E::entity_name(), &self.id)
    }
}

impl<E> CrudTool<E>
where
    E: Entity + for<'r> FromRow<'r, DbRow>,
{
    /// The current row, `None` when it does not exist.
    pub async fn get(&self) -> Result<Option<E>, DataError> {
        let (sql, args) = self.select_statement()?;
        let found = sqlx::query_as_with::<Db, E, _>(&sql, args)
            .fetch_optional(self.manager.pool())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        tracing::debug!(
            table = E::table_name(),
            id = %self.id,
            found = found.is_some(),
            "Fetched row"
        );
        Ok(found)
    }

    /// Like [`get`](Self::get), with absence reported as `DataError::NotFound`.
    pub async fn require(&self) -> Result<E, DataError> {
        self.get().await?.ok_or_else(|| self.not_found())
    }

    /// Partial update: only the fields in `data` change.
    ///
    /// Fails with `Validation` for unknown fields, bad values or an attempt
    /// to change the identifier, and with `NotFound` when the row is gone.
    pub async fn update(&self, data: FieldMap) -> Result<(), DataError> {
        let assignments = prepare_update::<E>(data)?;
        self.apply(move |_| Ok(assignments)).await.map(|_| ())
    }

    /// Read-modify-write: compute the changes from the current row while
    /// holding the row's write lock, apply them and return the new row.
    ///
    /// ```ignore
    /// tool.update_with(|record| {
    ///     FieldMap::new().with("count", record.count.unwrap_or(0) + 1)
    /// }).await?;
    /// ```
    pub async fn update_with<F>(&self, change: F) -> Result<E, DataError>
    where
        F: FnOnce(&E) -> FieldMap + Send,
    {
        self.apply(move |current| prepare_update::<E>(change(current))).await
    }

    /// Remove the row. Deleting a row that does not exist (including a
    /// second delete) fails with `NotFound`.
    pub async fn delete(&self) -> Result<(), DataError> {
        let _guard = self.manager.locks().acquire(E::table_name(), &self.id).await;
        let mut session = self.manager.open_session().await?;

        let filters = self.id_filter();
        let (sql, params) = self.query().filters(filters.clone()).build_delete()?;
        let args = bind::arguments(bind::filter_params::<E>(&filters, params))?;
        let result = sqlx::query_with::<Db, _>(&sql, args)
            .execute(session.conn())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        if result.rows_affected() == 0 {
            tracing::debug!(table = E::table_name(), id = %self.id, "Nothing to delete");
            return Err(self.not_found());
        }
        session.release(true).await?;

        tracing::debug!(table = E::table_name(), id = %self.id, rows = result.rows_affected(), "Deleted row");
        Ok(())
    }

    async fn apply<F>(&self, change: F) -> Result<E, DataError>
    where
        F: FnOnce(&E) -> Result<Vec<Assignment>, DataError> + Send,
    {
        let _guard = self.manager.locks().acquire(E::table_name(), &self.id).await;
        let mut session = self.manager.open_session().await?;

        let (sql, args) = self.select_statement()?;
        let current = sqlx::query_as_with::<Db, E, _>(&sql, args)
            .fetch_optional(session.conn())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        let Some(current) = current else {
            return Err(self.not_found());
        };

        let assignments = change(&current)?;
        if assignments.is_empty() {
            session.release(true).await?;
            return Ok(current);
        }

        let set_columns: Vec<&str> = assignments.iter().map(|(column, _)| column.name).collect();
        let filters = self.id_filter();
        let (sql, where_params) = self.query().filters(filters.clone()).build_update(&set_columns)?;
        let params = assignments
            .into_iter()
            .map(|(column, value)| (column.ty, value))
            .chain(bind::filter_params::<E>(&filters, where_params));
        let args = bind::arguments(params)?;
        let result = sqlx::query_with::<Db, _>(&sql, args)
            .execute(session.conn())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        let (sql, args) = self.select_statement()?;
        let updated = sqlx::query_as_with::<Db, E, _>(&sql, args)
            .fetch_one(session.conn())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        session.release(true).await?;

        tracing::debug!(table = E::table_name(), id = %self.id, rows = result.rows_affected(), "Updated row");
        Ok(updated)
    }
}

impl<E: Entity> Clone for CrudTool<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            manager: self.manager.clone(),
        }
    }
}

impl<E: Entity> std::fmt::Debug for CrudTool<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudTool")
            .field("entity", &E::entity_name())
            .field("id", &self.id.to_string())
            .finish()
    }
}
