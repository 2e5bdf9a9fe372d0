use super::typed::ConfigProperties;
use super::{ConfigError, CrudkitConfig};

/// A config key that is missing or unusable.
#[derive(Debug)]
pub struct MissingKeyError {
    /// Section prefix or component that requires this key.
    pub source: String,
    pub key: String,
    pub expected_type: String,
    /// Environment variable that would provide the key.
    pub env_hint: String,
    pub description: Option<String>,
}

impl MissingKeyError {
    fn for_key(source: &str, key: &str, expected_type: &str) -> Self {
        Self {
            source: source.to_string(),
            key: key.to_string(),
            expected_type: expected_type.to_string(),
            env_hint: key.to_uppercase().replace('.', "_"),
            description: None,
        }
    }
}

impl std::fmt::Display for MissingKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "  - `{}`: key '{}' ({}), set env var `{}`",
            self.source, self.key, self.expected_type, self.env_hint
        )?;
        if let Some(desc) = &self.description {
            write!(f, " -- {desc}")?;
        }
        Ok(())
    }
}

/// Aggregated config validation error.
#[derive(Debug)]
pub struct ConfigValidationError {
    pub errors: Vec<MissingKeyError>,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Invalid configuration:")?;
        for err in &self.errors {
            writeln!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigValidationError {}

/// Check that each `(source, key, type_name)` entry is present in `config`.
pub fn validate_keys(config: &CrudkitConfig, keys: &[(&str, &str, &str)]) -> Vec<MissingKeyError> {
    keys.iter()
        .filter(|(_, key, _)| !config.contains_key(key))
        .map(|(source, key, type_name)| MissingKeyError::for_key(source, key, type_name))
        .collect()
}

/// Validate a typed section: required keys must be present and the section
/// must construct without type mismatches or constraint violations.
pub fn validate_section<C: ConfigProperties>(config: &CrudkitConfig) -> Result<(), ConfigValidationError> {
    let prefix = C::prefix();

    let mut errors: Vec<MissingKeyError> = C::properties_metadata()
        .into_iter()
        .filter(|prop| prop.required && !config.contains_key(&prop.full_key))
        .map(|prop| MissingKeyError {
            source: prefix.to_string(),
            env_hint: prop.env_var(),
            key: prop.full_key,
            expected_type: prop.type_name.to_string(),
            description: prop.description,
        })
        .collect();

    if errors.is_empty() {
        match C::from_config(config) {
            Ok(_) => {}
            Err(ConfigError::TypeMismatch { key, expected }) => {
                let mut err = MissingKeyError::for_key(prefix, &key, expected);
                err.description = Some(format!("type mismatch: expected {expected}"));
                errors.push(err);
            }
            Err(ConfigError::Validation(details)) => {
                for detail in details {
                    let mut err = MissingKeyError::for_key(prefix, &detail.key, "valid");
                    err.description = Some(detail.message);
                    errors.push(err);
                }
            }
            Err(ConfigError::NotFound(key)) => {
                errors.push(MissingKeyError::for_key(prefix, &key, "unknown"));
            }
            Err(ConfigError::Load(msg)) => {
                let mut err = MissingKeyError::for_key(prefix, prefix, "loadable");
                err.description = Some(msg);
                errors.push(err);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigValidationError { errors })
    }
}
