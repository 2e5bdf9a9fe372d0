use crate::entity::Entity;
use crate::error::DataError;
use crate::page::{Page, Pageable};
use crate::query::Filter;
use crate::value::FieldMap;
use std::future::Future;

/// Generic async repository trait for CRUD operations on one entity type.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait` needed.
pub trait Repository<E: Entity>: Send + Sync {
    /// Insert a new row and return it as stored, generated identifier included.
    fn create(&self, data: FieldMap) -> impl Future<Output = Result<E, DataError>> + Send;
    fn find_by_id(&self, id: &E::Id) -> impl Future<Output = Result<Option<E>, DataError>> + Send;
    fn find_all(&self) -> impl Future<Output = Result<Vec<E>, DataError>> + Send;
    fn find_filtered(
        &self,
        filters: &[Filter],
    ) -> impl Future<Output = Result<Vec<E>, DataError>> + Send;
    fn find_page(
        &self,
        pageable: &Pageable,
        filters: &[Filter],
    ) -> impl Future<Output = Result<Page<E>, DataError>> + Send;
    /// Partial update; `NotFound` when the row does not exist.
    fn update(&self, id: &E::Id, data: FieldMap) -> impl Future<Output = Result<(), DataError>> + Send;
    /// `NotFound` when the row does not exist.
    fn delete(&self, id: &E::Id) -> impl Future<Output = Result<(), DataError>> + Send;
    fn count(&self, filters: &[Filter]) -> impl Future<Output = Result<u64, DataError>> + Send;
}
