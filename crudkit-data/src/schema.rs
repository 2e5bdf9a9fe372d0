//! DDL generation for entity tables.

use crate::entity::{Column, TableDef};
use crate::query::{is_valid_identifier, quote_identifier, Dialect, QueryError};
use crate::value::ColumnType;

/// Render `CREATE TABLE IF NOT EXISTS` for `table` in the given dialect.
/// Table and column names are double-quoted.
///
/// ```ignore
/// let ddl = create_table_sql(&TestRecord::table_def(), Dialect::Postgres)?;
/// // CREATE TABLE IF NOT EXISTS "tests" ("id" BIGSERIAL PRIMARY KEY, "status" TEXT, ...)
/// ```
pub fn create_table_sql(table: &TableDef, dialect: Dialect) -> Result<String, QueryError> {
    if !is_valid_identifier(table.name, false) {
        return Err(QueryError::InvalidIdentifier {
            kind: "table",
            ident: table.name.to_string(),
        });
    }
    if table.columns.is_empty() {
        return Err(QueryError::EmptyStatement("create table"));
    }

    let mut definitions = Vec::with_capacity(table.columns.len());
    for column in table.columns {
        if !is_valid_identifier(column.name, false) {
            return Err(QueryError::InvalidIdentifier {
                kind: "column",
                ident: column.name.to_string(),
            });
        }
        definitions.push(column_definition(column, dialect));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_identifier(table.name, false),
        definitions.join(", ")
    ))
}

fn column_definition(column: &Column, dialect: Dialect) -> String {
    let name = quote_identifier(column.name, false);
    if column.primary_key && column.generated {
        let ty = match dialect {
            Dialect::Postgres if column.ty == ColumnType::Integer => "SERIAL",
            Dialect::Postgres => "BIGSERIAL",
            // SQLite only autoincrements an `INTEGER PRIMARY KEY` rowid alias
            Dialect::Sqlite => {
                return format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT");
            }
        };
        return format!("{name} {ty} PRIMARY KEY");
    }

    let mut def = format!("{name} {}", sql_type(column.ty, dialect));
    if column.primary_key {
        def.push_str(" PRIMARY KEY");
    } else {
        if !column.nullable {
            def.push_str(" NOT NULL");
        }
        if column.unique {
            def.push_str(" UNIQUE");
        }
    }
    def
}

/// SQL type name for a column type.
pub fn sql_type(ty: ColumnType, dialect: Dialect) -> &'static str {
    match (ty, dialect) {
        (ColumnType::Integer, _) => "INTEGER",
        (ColumnType::BigInt, Dialect::Postgres) => "BIGINT",
        (ColumnType::BigInt, _) => "INTEGER",
        (ColumnType::Float, Dialect::Postgres) => "DOUBLE PRECISION",
        (ColumnType::Float, _) => "REAL",
        (ColumnType::Boolean, _) => "BOOLEAN",
        (ColumnType::Text, _) => "TEXT",
        (ColumnType::Timestamp, Dialect::Postgres) => "TIMESTAMPTZ",
        (ColumnType::Timestamp, _) => "TIMESTAMP",
    }
}
