use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

use crate::error::{DataError, FieldError};

/// Declared storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInt,
    Float,
    Boolean,
    Text,
    /// UTC timestamp with microsecond precision.
    Timestamp,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Text => "text",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The column type this value binds as when no column is known.
    pub fn natural_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Int(_) => Some(ColumnType::BigInt),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
        }
    }

    /// Convert this value to the representation stored in a column of type `ty`.
    ///
    /// Lossless widenings are accepted (integer to float, RFC 3339 text to
    /// timestamp); everything else is a type error. `Null` passes through,
    /// nullability is checked by the caller.
    pub fn coerce_to(self, ty: ColumnType) -> Result<Value, String> {
        match (self, ty) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Int(i), ColumnType::Integer) => i32::try_from(i)
                .map(|_| Value::Int(i))
                .map_err(|_| format!("{i} is out of range for integer")),
            (Value::Int(i), ColumnType::BigInt) => Ok(Value::Int(i)),
            (Value::Int(i), ColumnType::Float) => Ok(Value::Float(i as f64)),
            (Value::Float(f), ColumnType::Float) => Ok(Value::Float(f)),
            (Value::Bool(b), ColumnType::Boolean) => Ok(Value::Bool(b)),
            (Value::Text(s), ColumnType::Text) => Ok(Value::Text(s)),
            (Value::Text(s), ColumnType::Timestamp) => DateTime::parse_from_rfc3339(&s)
                .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
                .map_err(|e| format!("'{s}' is not an RFC 3339 timestamp: {e}")),
            (Value::Timestamp(ts), ColumnType::Timestamp) => Ok(Value::Timestamp(ts)),
            (other, ty) => Err(format!("expected {ty}, got {}", other.kind())),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }

    /// Current time, truncated to the microsecond precision the stores keep.
    pub fn now() -> Value {
        Value::Timestamp(Utc::now().trunc_subsecs(6))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.6f")),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = String;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(Value::Int(i)),
                (None, Some(f)) => Ok(Value::Float(f)),
                _ => Err(format!("number {n} does not fit a column value")),
            },
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Array(_) => Err("arrays are not column values".to_string()),
            serde_json::Value::Object(_) => Err("objects are not column values".to_string()),
        }
    }
}

/// Ordered `field -> value` mapping used as input of create and update.
///
/// Inserting a field that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMap {
    entries: Vec<(String, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Build a field map from a JSON object.
    ///
    /// Nested arrays and objects are rejected with a `Validation` error.
    pub fn from_json(json: serde_json::Value) -> Result<Self, DataError> {
        let serde_json::Value::Object(object) = json else {
            return Err(DataError::invalid("$", "expected a JSON object"));
        };
        let mut map = FieldMap::new();
        let mut errors = Vec::new();
        for (field, value) in object {
            match Value::try_from(value) {
                Ok(value) => map.insert(field, value),
                Err(message) => errors.push(FieldError::new(field, message)),
            }
        }
        if errors.is_empty() {
            Ok(map)
        } else {
            Err(DataError::Validation(errors))
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
