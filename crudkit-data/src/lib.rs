//! # crudkit-data
//!
//! Backend-agnostic data layer: the [`Entity`] contract, dynamically typed
//! [`Value`]s, the [`QueryBuilder`], DDL rendering, input validation,
//! pagination and the [`Repository`] trait. Database drivers live in
//! `crudkit-data-sqlx`.

pub mod entity;
pub mod error;
pub mod page;
pub mod query;
pub mod repository;
pub mod schema;
pub mod validate;
pub mod value;

pub use entity::{Column, ColumnDefault, Entity, TableDef};
pub use error::{DataError, FieldError};
pub use page::{Page, Pageable};
pub use query::{Dialect, Filter, IdentifierPolicy, QueryBuilder, QueryError};
pub use repository::Repository;
pub use value::{ColumnType, FieldMap, Value};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Column, ColumnDefault, ColumnType, DataError, Entity, FieldMap, Filter, Page, Pageable,
        QueryBuilder, Repository, TableDef, Value,
    };
}
