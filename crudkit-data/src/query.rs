use crate::value::Value;

/// A fluent SQL statement builder for single-table operations.
///
/// # Example
///
/// ```ignore
/// let q = QueryBuilder::new("tests")
///     .dialect(Dialect::Postgres)
///     .where_eq("status", "test")
///     .where_gt("count", 0)
///     .order_by("id", true)
///     .limit(10);
/// let (sql, params) = q.build_select(&["id", "status"])?;
/// ```
///
/// Every statement is built through [`QueryBuilder::build_select`] and
/// friends, which validate identifiers (and quote them under
/// [`IdentifierPolicy::Quote`]) and return the bind values in placeholder
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SQLite-style `?` placeholders (default).
    Sqlite,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => "?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierPolicy {
    /// Validate identifiers against a conservative pattern.
    Validate,
    /// Validate and double-quote identifiers.
    Quote,
}

/// One predicate of a filtered query. Filters are combined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    NotEq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    Like(String, String),
    In(String, Vec<Value>),
    IsNull(String),
    IsNotNull(String),
}

impl Filter {
    /// `column = value`; comparing with `Null` becomes `IS NULL`.
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => Filter::IsNull(column.to_string()),
            value => Filter::Eq(column.to_string(), value),
        }
    }

    /// `column != value`; comparing with `Null` becomes `IS NOT NULL`.
    pub fn not_eq(column: &str, value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => Filter::IsNotNull(column.to_string()),
            value => Filter::NotEq(column.to_string(), value),
        }
    }

    pub fn gt(column: &str, value: impl Into<Value>) -> Self {
        Filter::Gt(column.to_string(), value.into())
    }

    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Filter::Gte(column.to_string(), value.into())
    }

    pub fn lt(column: &str, value: impl Into<Value>) -> Self {
        Filter::Lt(column.to_string(), value.into())
    }

    pub fn lte(column: &str, value: impl Into<Value>) -> Self {
        Filter::Lte(column.to_string(), value.into())
    }

    pub fn like(column: &str, pattern: &str) -> Self {
        Filter::Like(column.to_string(), pattern.to_string())
    }

    pub fn is_in<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        )
    }

    pub fn is_null(column: &str) -> Self {
        Filter::IsNull(column.to_string())
    }

    pub fn is_not_null(column: &str) -> Self {
        Filter::IsNotNull(column.to_string())
    }

    /// The column this predicate applies to.
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(col, _)
            | Filter::NotEq(col, _)
            | Filter::Gt(col, _)
            | Filter::Gte(col, _)
            | Filter::Lt(col, _)
            | Filter::Lte(col, _)
            | Filter::Like(col, _)
            | Filter::In(col, _)
            | Filter::IsNull(col)
            | Filter::IsNotNull(col) => col,
        }
    }

    fn comparison(&self) -> Option<(&'static str, &Value)> {
        match self {
            Filter::Eq(_, v) => Some(("=", v)),
            Filter::NotEq(_, v) => Some(("!=", v)),
            Filter::Gt(_, v) => Some((">", v)),
            Filter::Gte(_, v) => Some((">=", v)),
            Filter::Lt(_, v) => Some(("<", v)),
            Filter::Lte(_, v) => Some(("<=", v)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    conditions: Vec<Filter>,
    order: Vec<(String, bool)>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    dialect: Dialect,
    identifier_policy: IdentifierPolicy,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            conditions: Vec::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            dialect: Dialect::Sqlite,
            identifier_policy: IdentifierPolicy::Validate,
        }
    }

    pub fn new_with_dialect(table: &str, dialect: Dialect) -> Self {
        Self::new(table).dialect(dialect)
    }

    /// Set the SQL dialect (affects placeholder style).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.identifier_policy = policy;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.conditions.push(filter);
        self
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.conditions.extend(filters);
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn where_not_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::not_eq(column, value))
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.filter(Filter::like(column, pattern))
    }

    pub fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::gt(column, value))
    }

    pub fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::lt(column, value))
    }

    pub fn where_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filter(Filter::is_in(column, values))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.filter(Filter::is_null(column))
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.filter(Filter::is_not_null(column))
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Build `SELECT <columns> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT ..]`.
    pub fn build_select(&self, columns: &[&str]) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let columns = self.column_list(columns, true)?;

        let mut sql = format!("SELECT {columns} FROM {table}");
        let mut params = Vec::new();
        let mut next = 1usize;
        self.append_where(&mut sql, &mut params, &mut next)?;
        self.append_order(&mut sql)?;
        self.append_limit_offset(&mut sql);
        Ok((sql, params))
    }

    pub fn build_count(&self) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        let mut params = Vec::new();
        let mut next = 1usize;
        self.append_where(&mut sql, &mut params, &mut next)?;
        Ok((sql, params))
    }

    /// Build `INSERT INTO <table> (<columns>) VALUES (..) [RETURNING ..]`.
    ///
    /// Values are bound by the caller in `columns` order. With no columns
    /// the statement inserts a row of defaults.
    pub fn build_insert(&self, columns: &[&str], returning: &[&str]) -> Result<String, QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut sql = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let names = self.column_list(columns, false)?;
            let placeholders: Vec<_> = (1..=columns.len())
                .map(|i| self.dialect.placeholder(i))
                .collect();
            format!("INSERT INTO {table} ({names}) VALUES ({})", placeholders.join(", "))
        };
        self.append_returning(&mut sql, returning)?;
        Ok(sql)
    }

    /// Build `UPDATE <table> SET a = ?, b = ? [WHERE ..]`.
    ///
    /// The caller binds the SET values first (in `set_columns` order), then
    /// the returned WHERE parameters.
    pub fn build_update(&self, set_columns: &[&str]) -> Result<(String, Vec<Value>), QueryError> {
        if set_columns.is_empty() {
            return Err(QueryError::EmptyStatement("update"));
        }
        let table = self.ident(&self.table, false, "table")?;
        let mut next = 1usize;
        let mut assignments = Vec::with_capacity(set_columns.len());
        for col in set_columns {
            let col = self.ident(col, false, "column")?;
            assignments.push(format!("{col} = {}", self.dialect.placeholder(next)));
            next += 1;
        }
        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        let mut params = Vec::new();
        self.append_where(&mut sql, &mut params, &mut next)?;
        Ok((sql, params))
    }

    pub fn build_delete(&self) -> Result<(String, Vec<Value>), QueryError> {
        let table = self.ident(&self.table, false, "table")?;
        let mut sql = format!("DELETE FROM {table}");
        let mut params = Vec::new();
        let mut next = 1usize;
        self.append_where(&mut sql, &mut params, &mut next)?;
        Ok((sql, params))
    }

    fn append_where(
        &self,
        sql: &mut String,
        params: &mut Vec<Value>,
        next: &mut usize,
    ) -> Result<(), QueryError> {
        if self.conditions.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.conditions.len());
        for cond in &self.conditions {
            let col = self.ident(cond.column(), false, "column")?;
            let clause = if let Some((op, value)) = cond.comparison() {
                let placeholder = self.dialect.placeholder(*next);
                *next += 1;
                params.push(value.clone());
                format!("{col} {op} {placeholder}")
            } else {
                match cond {
                    Filter::Like(_, pattern) => {
                        let placeholder = self.dialect.placeholder(*next);
                        *next += 1;
                        params.push(Value::Text(pattern.clone()));
                        format!("{col} LIKE {placeholder}")
                    }
                    // `IN ()` is invalid SQL; an empty set matches nothing
                    Filter::In(_, values) if values.is_empty() => "1 = 0".to_string(),
                    Filter::In(_, values) => {
                        let placeholders: Vec<_> = values
                            .iter()
                            .map(|_| {
                                let placeholder = self.dialect.placeholder(*next);
                                *next += 1;
                                placeholder
                            })
                            .collect();
                        params.extend(values.iter().cloned());
                        format!("{col} IN ({})", placeholders.join(", "))
                    }
                    Filter::IsNull(_) => format!("{col} IS NULL"),
                    _ => format!("{col} IS NOT NULL"),
                }
            };
            clauses.push(clause);
        }
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
        Ok(())
    }

    fn append_order(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.order.is_empty() {
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(self.order.len());
        for (col, asc) in &self.order {
            let col = self.ident(col, false, "column")?;
            clauses.push(format!("{col} {}", if *asc { "ASC" } else { "DESC" }));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&clauses.join(", "));
        Ok(())
    }

    fn append_limit_offset(&self, sql: &mut String) {
        if let Some(limit) = self.limit_val {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset_val {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
    }

    fn append_returning(&self, sql: &mut String, returning: &[&str]) -> Result<(), QueryError> {
        if !returning.is_empty() {
            sql.push_str(" RETURNING ");
            sql.push_str(&self.column_list(returning, true)?);
        }
        Ok(())
    }

    fn column_list(&self, columns: &[&str], allow_star: bool) -> Result<String, QueryError> {
        let mut out = Vec::with_capacity(columns.len());
        for col in columns {
            out.push(self.ident(col, allow_star, "column")?);
        }
        Ok(out.join(", "))
    }

    fn ident(&self, ident: &str, allow_star: bool, kind: &'static str) -> Result<String, QueryError> {
        if !is_valid_identifier(ident, allow_star) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        match self.identifier_policy {
            IdentifierPolicy::Quote => Ok(quote_identifier(ident, allow_star)),
            IdentifierPolicy::Validate => Ok(ident.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
    /// A write statement with nothing to write.
    EmptyStatement(&'static str),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            QueryError::EmptyStatement(what) => write!(f, "Empty {what} statement"),
        }
    }
}

impl std::error::Error for QueryError {}

pub(crate) fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn quote_identifier(ident: &str, allow_star: bool) -> String {
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("\"{part}\"")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
