//! Typed parameter binding.
//!
//! Values are bound with the Rust type of their column so that `NULL`s
//! carry a type and `INTEGER` columns receive 32-bit integers.

use chrono::{DateTime, Utc};
use crudkit_data::{ColumnType, DataError, Entity, Filter, Value};
use sqlx::Arguments;

use crate::Db;

pub(crate) type DbArguments = <Db as sqlx::Database>::Arguments<'static>;

/// Build the argument list for `values`, in order.
pub(crate) fn arguments(
    values: impl IntoIterator<Item = (ColumnType, Value)>,
) -> Result<DbArguments, DataError> {
    let mut args = DbArguments::default();
    for (ty, value) in values {
        add(&mut args, ty, value)?;
    }
    Ok(args)
}

fn add(args: &mut DbArguments, ty: ColumnType, value: Value) -> Result<(), DataError> {
    let added = match (ty, value) {
        (ColumnType::Integer, Value::Null) => args.add(None::<i32>),
        (ColumnType::BigInt, Value::Null) => args.add(None::<i64>),
        (ColumnType::Float, Value::Null) => args.add(None::<f64>),
        (ColumnType::Boolean, Value::Null) => args.add(None::<bool>),
        (ColumnType::Text, Value::Null) => args.add(None::<String>),
        (ColumnType::Timestamp, Value::Null) => args.add(None::<DateTime<Utc>>),
        (ColumnType::Integer, Value::Int(i)) => match i32::try_from(i) {
            Ok(i) => args.add(i),
            Err(_) => return Err(DataError::invalid("$", format!("{i} is out of range for integer"))),
        },
        (_, Value::Int(i)) => args.add(i),
        (_, Value::Float(f)) => args.add(f),
        (_, Value::Bool(b)) => args.add(b),
        (_, Value::Text(s)) => args.add(s),
        (_, Value::Timestamp(ts)) => args.add(ts),
    };
    added.map_err(DataError::Persistence)
}

/// Pair WHERE parameters produced from `filters` with the type of the
/// column each one is compared against.
pub(crate) fn filter_params<E: Entity>(
    filters: &[Filter],
    params: Vec<Value>,
) -> Vec<(ColumnType, Value)> {
    let column_type = |name: &str| E::column(name).map(|c| c.ty);

    let mut types = Vec::with_capacity(params.len());
    for filter in filters {
        match filter {
            Filter::Like(..) => types.push(Some(ColumnType::Text)),
            Filter::In(column, values) => {
                types.extend(std::iter::repeat(column_type(column)).take(values.len()))
            }
            Filter::IsNull(_) | Filter::IsNotNull(_) => {}
            other => types.push(column_type(other.column())),
        }
    }

    params
        .into_iter()
        .zip(types)
        .map(|(value, ty)| {
            let ty = ty
                .or_else(|| value.natural_type())
                .unwrap_or(ColumnType::Text);
            (ty, value)
        })
        .collect()
}
