use crate::query::QueryError;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur in the data layer.
///
/// `NotFound` is an expected outcome for lookups by identifier; the other
/// variants are failures the caller decides how to handle. Nothing in the
/// data layer retries.
#[derive(Debug)]
pub enum DataError {
    /// Input data is malformed: unknown field, wrong type, missing required field.
    Validation(Vec<FieldError>),
    /// The requested identifier does not exist.
    NotFound(String),
    /// The store failed: unreachable, constraint violation, pool exhausted.
    Persistence(Box<dyn std::error::Error + Send + Sync>),
    /// Creating or verifying the schema failed.
    Schema(String),
}

impl DataError {
    /// Wrap a driver error as a persistence failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Persistence(Box::new(err))
    }

    /// Shorthand for a validation error on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        DataError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DataError::NotFound(format!("{entity} with id {id}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound(_))
    }

    /// Field errors carried by a `Validation` error (empty otherwise).
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            DataError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Validation(errors) => {
                write!(f, "Validation error: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Persistence(err) => write!(f, "Persistence error: {err}"),
            DataError::Schema(msg) => write!(f, "Schema error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Persistence(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidIdentifier { kind, ident } => {
                DataError::invalid(ident, format!("invalid {kind} identifier"))
            }
            QueryError::EmptyStatement(what) => DataError::invalid(what, "nothing to write"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_every_field() {
        let err = DataError::Validation(vec![
            FieldError::new("count", "expected integer"),
            FieldError::new("color", "unknown field"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation error: count: expected integer; color: unknown field"
        );
    }

    #[test]
    fn persistence_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = DataError::persistence(io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_message() {
        let err = DataError::not_found("TestRecord", 42);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: TestRecord with id 42");
    }
}
