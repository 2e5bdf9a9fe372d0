use std::ops::Deref;

use crudkit_data::{DataError, FieldMap, Filter};
use crudkit_data_sqlx::{ConnectionManager, CrudTool};

use crate::models::TestRecord;

/// CRUD tool for [`TestRecord`] rows.
#[derive(Clone, Debug)]
pub struct TestTool(CrudTool<TestRecord>);

impl TestTool {
    pub fn new(manager: &ConnectionManager, id: i64) -> Self {
        TestTool(CrudTool::new(id, manager.clone()))
    }

    pub async fn create(manager: &ConnectionManager, data: FieldMap) -> Result<TestRecord, DataError> {
        manager.repository::<TestRecord>().create(data).await
    }

    pub async fn get_all(manager: &ConnectionManager) -> Result<Vec<TestRecord>, DataError> {
        manager.repository::<TestRecord>().get_all().await
    }

    /// Records whose status equals `status`.
    pub async fn get_by_status(
        manager: &ConnectionManager,
        status: &str,
    ) -> Result<Vec<TestRecord>, DataError> {
        manager
            .repository::<TestRecord>()
            .get_all_with_filters(&[Filter::eq("status", status)])
            .await
    }

    pub async fn update_count(&self, count: i32) -> Result<(), DataError> {
        self.update(FieldMap::new().with("count", count)).await
    }
}

impl Deref for TestTool {
    type Target = CrudTool<TestRecord>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
