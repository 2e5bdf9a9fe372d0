//! Input checks for create, update and filtered queries.
//!
//! Every function collects all field problems before failing so a caller
//! sees the complete list in one `DataError::Validation`.

use crate::entity::{Column, Entity};
use crate::error::{DataError, FieldError};
use crate::query::Filter;
use crate::value::{FieldMap, Value};

/// A column paired with the value to write into it.
pub type Assignment = (&'static Column, Value);

/// Check `data` for an insert into `E`'s table.
///
/// Returns the values to insert in declared column order: supplied values
/// coerced to their column type, then declared defaults for unset columns.
/// Generated identifiers are left to the store unless a value is supplied.
pub fn prepare_insert<E: Entity>(data: FieldMap) -> Result<Vec<Assignment>, DataError> {
    let mut errors = unknown_fields::<E>(&data);
    let mut assignments = Vec::with_capacity(E::columns().len());

    for column in E::columns() {
        let supplied = data.get(column.name).cloned();
        let value = match supplied {
            Some(Value::Null) | None if column.generated => continue,
            Some(value) => value,
            None => match column.default {
                Some(default) => default.evaluate(),
                None if column.is_required() => {
                    errors.push(FieldError::new(column.name, "required field is missing"));
                    continue;
                }
                None => continue,
            },
        };
        match check_value(column, value) {
            Ok(value) => assignments.push((column, value)),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(assignments)
    } else {
        Err(DataError::Validation(errors))
    }
}

/// Check `data` for a partial update of one `E` row.
///
/// The identifier column is immutable. Only supplied fields are returned,
/// in the order they were supplied; an empty map yields no assignments.
pub fn prepare_update<E: Entity>(data: FieldMap) -> Result<Vec<Assignment>, DataError> {
    let mut errors = unknown_fields::<E>(&data);
    let mut assignments = Vec::with_capacity(data.len());

    for (field, value) in data {
        let Some(column) = E::column(&field) else {
            continue;
        };
        if column.name == E::id_column() {
            errors.push(FieldError::new(field, "identifier cannot be changed"));
            continue;
        }
        match check_value(column, value) {
            Ok(value) => assignments.push((column, value)),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(assignments)
    } else {
        Err(DataError::Validation(errors))
    }
}

/// Check that every filter targets a declared column of `E` and coerce the
/// compared values to the column type.
pub fn prepare_filters<E: Entity>(filters: &[Filter]) -> Result<Vec<Filter>, DataError> {
    let mut errors = Vec::new();
    let mut checked = Vec::with_capacity(filters.len());

    for filter in filters {
        let Some(column) = E::column(filter.column()) else {
            errors.push(FieldError::new(filter.column(), "unknown field"));
            continue;
        };
        match coerce_filter(column, filter.clone()) {
            Ok(filter) => checked.push(filter),
            Err(message) => errors.push(FieldError::new(column.name, message)),
        }
    }

    if errors.is_empty() {
        Ok(checked)
    } else {
        Err(DataError::Validation(errors))
    }
}

fn unknown_fields<E: Entity>(data: &FieldMap) -> Vec<FieldError> {
    data.iter()
        .filter(|(field, _)| E::column(field).is_none())
        .map(|(field, _)| FieldError::new(field, "unknown field"))
        .collect()
}

fn check_value(column: &Column, value: Value) -> Result<Value, FieldError> {
    if value.is_null() && !column.nullable {
        return Err(FieldError::new(column.name, "must not be null"));
    }
    value
        .coerce_to(column.ty)
        .map_err(|message| FieldError::new(column.name, message))
}

fn coerce_filter(column: &Column, filter: Filter) -> Result<Filter, String> {
    let ty = column.ty;
    Ok(match filter {
        Filter::Eq(c, v) => Filter::eq(&c, v.coerce_to(ty)?),
        Filter::NotEq(c, v) => Filter::not_eq(&c, v.coerce_to(ty)?),
        Filter::Gt(c, v) => Filter::Gt(c, v.coerce_to(ty)?),
        Filter::Gte(c, v) => Filter::Gte(c, v.coerce_to(ty)?),
        Filter::Lt(c, v) => Filter::Lt(c, v.coerce_to(ty)?),
        Filter::Lte(c, v) => Filter::Lte(c, v.coerce_to(ty)?),
        Filter::In(c, values) => Filter::In(
            c,
            values
                .into_iter()
                .map(|v| v.coerce_to(ty))
                .collect::<Result<_, _>>()?,
        ),
        other @ (Filter::Like(..) | Filter::IsNull(_) | Filter::IsNotNull(_)) => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ColumnDefault;
    use crate::value::ColumnType;

    struct Ticket {
        id: i64,
    }

    const COLUMNS: &[Column] = &[
        Column::new("id", ColumnType::BigInt).primary_key().generated(),
        Column::new("title", ColumnType::Text).not_null(),
        Column::new("points", ColumnType::Integer),
        Column::new("opened_at", ColumnType::Timestamp)
            .not_null()
            .default(ColumnDefault::NOW),
    ];

    impl Entity for Ticket {
        type Id = i64;

        fn entity_name() -> &'static str {
            "Ticket"
        }

        fn table_name() -> &'static str {
            "tickets"
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
            vec![("id", self.id.into())]
        }
    }

    fn names(assignments: &[Assignment]) -> Vec<&'static str> {
        assignments.iter().map(|(c, _)| c.name).collect()
    }

    #[test]
    fn insert_fills_defaults_and_skips_generated_id() {
        let values = prepare_insert::<Ticket>(FieldMap::new().with("title", "t")).unwrap();
        assert_eq!(names(&values), vec!["title", "opened_at"]);
        assert!(matches!(values[1].1, Value::Timestamp(_)));
    }

    #[test]
    fn insert_collects_every_problem() {
        let data = FieldMap::new()
            .with("points", "many")
            .with("color", "red")
            .with("opened_at", Value::Null);
        let err = prepare_insert::<Ticket>(data).unwrap_err();
        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["color", "title", "points", "opened_at"]);
    }

    #[test]
    fn insert_keeps_explicit_id() {
        let data = FieldMap::new().with("id", 9i64).with("title", "t");
        let values = prepare_insert::<Ticket>(data).unwrap();
        assert_eq!(names(&values), vec!["id", "title", "opened_at"]);
    }

    #[test]
    fn update_rejects_identifier_change() {
        let err = prepare_update::<Ticket>(FieldMap::new().with("id", 2i64)).unwrap_err();
        assert_eq!(err.field_errors()[0].message, "identifier cannot be changed");
    }

    #[test]
    fn update_allows_null_only_in_nullable_columns() {
        let ok = prepare_update::<Ticket>(FieldMap::new().with("points", Value::Null)).unwrap();
        assert_eq!(ok[0].1, Value::Null);

        let err = prepare_update::<Ticket>(FieldMap::new().with("title", Value::Null)).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "title");
    }

    #[test]
    fn update_checks_integer_range() {
        let err = prepare_update::<Ticket>(FieldMap::new().with("points", i64::MAX)).unwrap_err();
        assert!(err.field_errors()[0].message.contains("out of range"));
    }

    #[test]
    fn filters_must_name_columns() {
        let err = prepare_filters::<Ticket>(&[Filter::eq("colour", "red")]).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "colour");
    }

    #[test]
    fn filters_are_coerced() {
        let checked = prepare_filters::<Ticket>(&[
            Filter::eq("opened_at", "2024-01-01T00:00:00Z"),
            Filter::is_in("points", [1, 2]),
        ])
        .unwrap();
        assert!(matches!(&checked[0], Filter::Eq(_, Value::Timestamp(_))));
        assert_eq!(checked[1], Filter::In("points".into(), vec![Value::Int(1), Value::Int(2)]));
    }
}
