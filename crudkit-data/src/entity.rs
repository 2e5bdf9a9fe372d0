use crate::value::{ColumnType, Value};

/// How a column obtains its value when `create` does not supply one.
#[derive(Debug, Clone, Copy)]
pub enum ColumnDefault {
    /// Evaluated once per created row, e.g. [`ColumnDefault::NOW`].
    Provider(fn() -> Value),
}

impl ColumnDefault {
    /// Current UTC time at creation.
    pub const NOW: ColumnDefault = ColumnDefault::Provider(Value::now);

    pub fn evaluate(&self) -> Value {
        match self {
            ColumnDefault::Provider(provider) => provider(),
        }
    }
}

/// A declared column of an entity table.
///
/// Built with `const` methods so column lists can live in statics:
///
/// ```ignore
/// const COLUMNS: &[Column] = &[
///     Column::new("id", ColumnType::BigInt).primary_key().generated(),
///     Column::new("status", ColumnType::Text),
///     Column::new("creating_date", ColumnType::Timestamp).not_null().default(ColumnDefault::NOW),
/// ];
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    /// The store assigns the value (identity / autoincrement).
    pub generated: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
}

impl Column {
    /// A nullable column without default.
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: true,
            primary_key: false,
            generated: false,
            unique: false,
            default: None,
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Primary key columns are implicitly unique and non-null.
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self.nullable = false;
        self
    }

    pub const fn generated(mut self) -> Self {
        self.generated = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Must be supplied by the caller on create.
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.generated && self.default.is_none()
    }
}

/// Table name plus ordered column list, as needed for schema creation.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl TableDef {
    pub fn of<E: Entity + ?Sized>() -> Self {
        Self {
            name: E::table_name(),
            columns: E::columns(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}

/// Trait representing a persisted record type mapped to one table.
///
/// Implemented manually per entity:
///
/// ```ignore
/// impl Entity for TestRecord {
///     type Id = i64;
///     fn entity_name() -> &'static str { "TestRecord" }
///     fn table_name() -> &'static str { "tests" }
///     fn id_column() -> &'static str { "id" }
///     fn columns() -> &'static [Column] { COLUMNS }
///     fn id(&self) -> &i64 { &self.id }
///     fn fields(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", self.id.into()), ("status", self.status.clone().into())]
///     }
/// }
/// ```
pub trait Entity: Send + Sync + Unpin + 'static {
    type Id: Clone + Send + Sync + std::fmt::Display + Into<Value> + 'static;

    /// Name used in diagnostics, e.g. `"TestRecord"`.
    fn entity_name() -> &'static str;
    fn table_name() -> &'static str;
    fn id_column() -> &'static str;
    fn columns() -> &'static [Column];
    fn id(&self) -> &Self::Id;

    /// Current field values in declared column order.
    fn fields(&self) -> Vec<(&'static str, Value)>;

    fn table_def() -> TableDef {
        TableDef::of::<Self>()
    }

    fn column(name: &str) -> Option<&'static Column> {
        Self::columns().iter().find(|c| c.name == name)
    }

    fn column_names() -> Vec<&'static str> {
        Self::columns().iter().map(|c| c.name).collect()
    }

    /// Human-readable `"<EntityName>: col=value, ..."` rendering.
    fn describe(&self) -> String {
        let attributes = self
            .fields()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}: {attributes}", Self::entity_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget {
        id: i64,
        label: Option<String>,
    }

    const WIDGET_COLUMNS: &[Column] = &[
        Column::new("id", ColumnType::BigInt).primary_key().generated(),
        Column::new("label", ColumnType::Text),
        Column::new("weight", ColumnType::Float).not_null(),
    ];

    impl Entity for Widget {
        type Id = i64;

        fn entity_name() -> &'static str {
            "Widget"
        }

        fn table_name() -> &'static str {
            "widgets"
        }

        fn id_column() -> &'static str {
            "id"
        }

        fn columns() -> &'static [Column] {
            WIDGET_COLUMNS
        }

        fn id(&self) -> &i64 {
            &self.id
        }

        fn fields(&self) -> Vec<(&'static str, Value)> {
            vec![("id", self.id.into()), ("label", self.label.clone().into())]
        }
    }

    #[test]
    fn describe_follows_field_order() {
        let w = Widget {
            id: 3,
            label: None,
        };
        assert_eq!(w.describe(), "Widget: id=3, label=None");
        assert_eq!(*w.id(), 3);
    }

    #[test]
    fn column_flags() {
        let id = Widget::column("id").unwrap();
        assert!(id.primary_key && id.unique && !id.nullable && id.generated);
        assert!(!id.is_required());
        assert!(Widget::column("weight").unwrap().is_required());
        assert!(!Widget::column("label").unwrap().is_required());
        assert!(Widget::column("missing").is_none());
    }

    #[test]
    fn table_def_lists_columns() {
        let def = Widget::table_def();
        assert_eq!(def.name, "widgets");
        assert_eq!(def.column_names(), vec!["id", "label", "weight"]);
    }

    #[test]
    fn now_default_yields_timestamp() {
        assert!(matches!(ColumnDefault::NOW.evaluate(), Value::Timestamp(_)));
    }
}
