use chrono::{DateTime, Utc};
use crudkit_data::{Column, ColumnDefault, ColumnType, Entity, Value};
use serde::{Deserialize, Serialize};

/// A row of the `tests` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TestRecord {
    pub id: i64,
    pub status: Option<String>,
    pub count: Option<i32>,
    pub creating_date: DateTime<Utc>,
}

const COLUMNS: &[Column] = &[
    Column::new("id", ColumnType::BigInt).primary_key().generated(),
    Column::new("status", ColumnType::Text),
    Column::new("count", ColumnType::Integer),
    Column::new("creating_date", ColumnType::Timestamp)
        .not_null()
        .default(ColumnDefault::NOW),
];

impl Entity for TestRecord {
    type Id = i64;

    fn entity_name() -> &'static str {
        "TestRecord"
    }

    fn table_name() -> &'static str {
        "tests"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn columns() -> &'static [Column] {
        COLUMNS
    }

    fn id(&self) -> &i64 {
        &self.id
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("status", self.status.clone().into()),
            ("count", self.count.into()),
            ("creating_date", self.creating_date.into()),
        ]
    }
}

impl std::fmt::Display for TestRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
