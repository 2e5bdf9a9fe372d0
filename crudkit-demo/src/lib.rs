//! Example entity and tool built on crudkit.
//!
//! [`TestRecord`] maps the `tests` table and [`TestTool`] adds a status
//! lookup and a count update on top of the generic CRUD tool.

pub mod models;
pub mod tools;

use crudkit_data::{DataError, Entity, FieldMap, TableDef};
use crudkit_data_sqlx::ConnectionManager;

pub use models::TestRecord;
pub use tools::TestTool;

/// Every table of the demo, for schema creation.
pub fn tables() -> Vec<TableDef> {
    vec![TestRecord::table_def()]
}

/// What one demo run produced.
#[derive(Debug)]
pub struct DemoOutcome {
    pub created: TestRecord,
    pub fetched: TestRecord,
    pub all: Vec<TestRecord>,
}

/// Create a record, read it back by identifier and list the table.
///
/// The schema must exist.
pub async fn run_demo(manager: &ConnectionManager) -> Result<DemoOutcome, DataError> {
    let created = TestTool::create(manager, FieldMap::new().with("status", "test").with("count", 1)).await?;
    tracing::info!(id = created.id, "Created test record");

    let fetched = TestTool::new(manager, created.id).require().await?;
    let all = TestTool::get_all(manager).await?;

    Ok(DemoOutcome {
        created,
        fetched,
        all,
    })
}
