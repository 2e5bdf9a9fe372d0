use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Read a YAML file (if present) and merge its flattened keys into `values`.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    load_yaml_str(&content, values)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
}

pub(crate) fn load_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Flatten a YAML tree into dot-separated keys.
///
/// Sequences are stored whole under their key and element-wise under
/// `key.0`, `key.1`, ... so that environment variables can address items.
pub(crate) fn flatten_yaml(
    prefix: &str,
    value: &serde_yaml::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => format!("{other:?}"),
                };
                flatten_yaml(&join_key(prefix, &key), v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) if !prefix.is_empty() => {
            out.insert(
                prefix.to_string(),
                ConfigValue::List(seq.iter().map(ConfigValue::from_yaml).collect()),
            );
            for (i, item) in seq.iter().enumerate() {
                flatten_yaml(&join_key(prefix, &i.to_string()), item, out);
            }
        }
        leaf if !prefix.is_empty() => {
            out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_mappings_become_dotted_keys() {
        let mut values = HashMap::new();
        load_yaml_str("database:\n  pool:\n    size: 5\n", &mut values).unwrap();
        assert!(matches!(values.get("database.pool.size"), Some(ConfigValue::Integer(5))));
    }

    #[test]
    fn sequences_are_indexed() {
        let mut values = HashMap::new();
        load_yaml_str("hosts:\n  - a\n  - b\n", &mut values).unwrap();
        assert!(matches!(values.get("hosts"), Some(ConfigValue::List(items)) if items.len() == 2));
        assert!(matches!(values.get("hosts.1"), Some(ConfigValue::String(s)) if s == "b"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let mut values = HashMap::new();
        load_yaml_file(Path::new("/definitely/not/here.yaml"), &mut values).unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn invalid_yaml_is_a_load_error() {
        let mut values = HashMap::new();
        let err = load_yaml_str("a: [unclosed", &mut values).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
