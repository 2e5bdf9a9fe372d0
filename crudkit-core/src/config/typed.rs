use super::{ConfigError, CrudkitConfig};

/// Metadata about a single configuration property.
#[derive(Debug, Clone)]
pub struct PropertyMeta {
    /// Relative key (e.g., `"pool.size"`).
    pub key: String,
    /// Absolute key (e.g., `"database.pool.size"`).
    pub full_key: String,
    /// Rust type name (e.g., `"u32"`).
    pub type_name: &'static str,
    /// Whether the property is required (no default and not `Option`).
    pub required: bool,
    pub default_value: Option<String>,
    pub description: Option<String>,
}

impl PropertyMeta {
    pub fn new(prefix: &str, key: &str, type_name: &'static str) -> Self {
        Self {
            key: key.to_string(),
            full_key: format!("{prefix}.{key}"),
            type_name,
            required: false,
            default_value: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl ToString) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Environment variable that overrides this property.
    pub fn env_var(&self) -> String {
        self.full_key.to_uppercase().replace('.', "_")
    }
}

/// Trait for strongly-typed configuration sections.
///
/// ```ignore
/// impl ConfigProperties for DatabaseConfig {
///     fn prefix() -> &'static str { "database" }
///     fn properties_metadata() -> Vec<PropertyMeta> { ... }
///     fn from_config(config: &CrudkitConfig) -> Result<Self, ConfigError> {
///         Ok(Self { host: config.get_or("database.host", "localhost".into()), .. })
///     }
/// }
/// ```
pub trait ConfigProperties: Sized {
    /// The configuration key prefix (e.g., `"database"`).
    fn prefix() -> &'static str;

    /// Metadata about all expected properties.
    fn properties_metadata() -> Vec<PropertyMeta>;

    fn from_config(config: &CrudkitConfig) -> Result<Self, ConfigError>;
}
