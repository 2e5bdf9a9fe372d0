use std::time::Duration;

use super::ConfigError;

/// A single configuration value as read from YAML or the environment.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    pub(crate) fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Bool(b) => ConfigValue::Bool(*b),
            serde_yaml::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => ConfigValue::Integer(i),
                (None, Some(f)) => ConfigValue::Float(f),
                _ => ConfigValue::String(n.to_string()),
            },
            serde_yaml::Value::String(s) => ConfigValue::String(s.clone()),
            serde_yaml::Value::Null => ConfigValue::Null,
            serde_yaml::Value::Sequence(seq) => {
                ConfigValue::List(seq.iter().map(ConfigValue::from_yaml).collect())
            }
            other => ConfigValue::String(format!("{other:?}")),
        }
    }

    fn mismatch<T>(key: &str, expected: &'static str) -> Result<T, ConfigError> {
        Err(ConfigError::TypeMismatch {
            key: key.to_string(),
            expected,
        })
    }
}

/// Conversion from a raw [`ConfigValue`] into a concrete type.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as a config value type",
    label = "not a valid config value type",
    note = "built-in types: String, i64, f64, bool, integers, Duration, Option<T>, Vec<T>"
)]
pub trait FromConfigValue: Sized {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError>;
}

impl FromConfigValue for String {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::String(s) => Ok(s.clone()),
            ConfigValue::Integer(i) => Ok(i.to_string()),
            ConfigValue::Float(f) => Ok(f.to_string()),
            ConfigValue::Bool(b) => Ok(b.to_string()),
            ConfigValue::Null | ConfigValue::List(_) => ConfigValue::mismatch(key, "String"),
        }
    }
}

impl FromConfigValue for i64 {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Integer(i) => Ok(*i),
            ConfigValue::String(s) => s
                .trim()
                .parse()
                .or_else(|_| ConfigValue::mismatch(key, "i64")),
            _ => ConfigValue::mismatch(key, "i64"),
        }
    }
}

impl FromConfigValue for f64 {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Float(f) => Ok(*f),
            ConfigValue::Integer(i) => Ok(*i as f64),
            ConfigValue::String(s) => s
                .trim()
                .parse()
                .or_else(|_| ConfigValue::mismatch(key, "f64")),
            _ => ConfigValue::mismatch(key, "f64"),
        }
    }
}

impl FromConfigValue for bool {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Bool(b) => Ok(*b),
            ConfigValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => ConfigValue::mismatch(key, "bool"),
            },
            _ => ConfigValue::mismatch(key, "bool"),
        }
    }
}

/// Durations are written as a whole number of seconds.
impl FromConfigValue for Duration {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        let secs = u64::from_config_value(value, key)
            .or_else(|_| ConfigValue::mismatch(key, "Duration (seconds)"))?;
        Ok(Duration::from_secs(secs))
    }
}

impl<T: FromConfigValue> FromConfigValue for Option<T> {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::Null => Ok(None),
            v => T::from_config_value(v, key).map(Some),
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for Vec<T> {
    fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
        match value {
            ConfigValue::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| T::from_config_value(v, &format!("{key}[{i}]")))
                .collect(),
            // Comma-separated strings come from environment variables
            ConfigValue::String(s) => s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| T::from_config_value(&ConfigValue::String(part.to_string()), key))
                .collect(),
            other => Ok(vec![T::from_config_value(other, key)?]),
        }
    }
}

macro_rules! impl_from_config_int {
    ($($ty:ty),+) => {
        $(
            impl FromConfigValue for $ty {
                fn from_config_value(value: &ConfigValue, key: &str) -> Result<Self, ConfigError> {
                    let i = i64::from_config_value(value, key)?;
                    <$ty>::try_from(i).or_else(|_| ConfigValue::mismatch(key, stringify!($ty)))
                }
            }
        )+
    };
}

impl_from_config_int!(u16, u32, u64, i32, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_strings_convert_to_numbers() {
        let v = ConfigValue::String("25".into());
        assert_eq!(u32::from_config_value(&v, "k").unwrap(), 25);
        assert_eq!(i64::from_config_value(&v, "k").unwrap(), 25);
    }

    #[test]
    fn negative_value_rejected_for_unsigned() {
        let v = ConfigValue::Integer(-1);
        assert!(matches!(
            u32::from_config_value(&v, "database.pool.size"),
            Err(ConfigError::TypeMismatch { expected: "u32", .. })
        ));
    }

    #[test]
    fn duration_is_seconds() {
        let v = ConfigValue::Integer(300);
        assert_eq!(Duration::from_config_value(&v, "k").unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn comma_separated_string_as_list() {
        let v = ConfigValue::String("a, b,c".into());
        let items: Vec<String> = Vec::from_config_value(&v, "k").unwrap();
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[test]
    fn null_is_none() {
        let v: Option<String> = Option::from_config_value(&ConfigValue::Null, "k").unwrap();
        assert!(v.is_none());
    }
}
