use super::ConfigError;

/// Resolves the reference inside a `${...}` placeholder to its secret value.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError>;
}

/// Default resolver: environment variables and files.
///
/// - `${VAR_NAME}` reads an environment variable
/// - `${env:VAR_NAME}` same, explicit form
/// - `${file:/path/to/secret}` reads a file, trimmed (e.g. a mounted DB password)
pub struct DefaultSecretResolver;

impl SecretResolver for DefaultSecretResolver {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        let reference = reference.trim();
        if let Some(path) = reference.strip_prefix("file:") {
            let path = path.trim();
            std::fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .map_err(|e| ConfigError::Load(format!("Secret file '{path}': {e}")))
        } else {
            let var = reference.strip_prefix("env:").unwrap_or(reference).trim();
            std::env::var(var).map_err(|_| ConfigError::NotFound(format!("env:{var}")))
        }
    }
}

/// Replace every `${...}` placeholder in `value` using `resolver`.
pub fn resolve_placeholders(
    value: &str,
    resolver: &dyn SecretResolver,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let end = rest[start..]
            .find('}')
            .ok_or_else(|| ConfigError::Load(format!("Unclosed placeholder in: {value}")))?;
        out.push_str(&rest[..start]);
        out.push_str(&resolver.resolve(&rest[start + 2..start + end])?);
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn resolves_env_placeholder() {
        std::env::set_var("CRUDKIT_TEST_DB_PASSWORD", "s3cret");
        let result = resolve_placeholders("${CRUDKIT_TEST_DB_PASSWORD}", &DefaultSecretResolver).unwrap();
        assert_eq!(result, "s3cret");
        std::env::remove_var("CRUDKIT_TEST_DB_PASSWORD");
    }

    #[test]
    #[serial]
    fn resolves_placeholder_embedded_in_text() {
        std::env::set_var("CRUDKIT_TEST_DB_HOST", "db.internal");
        let result =
            resolve_placeholders("postgres://${env:CRUDKIT_TEST_DB_HOST}:5432/app", &DefaultSecretResolver)
                .unwrap();
        assert_eq!(result, "postgres://db.internal:5432/app");
        std::env::remove_var("CRUDKIT_TEST_DB_HOST");
    }

    #[test]
    fn resolved_value_is_not_rescanned() {
        struct Literal;
        impl SecretResolver for Literal {
            fn resolve(&self, _reference: &str) -> Result<String, ConfigError> {
                Ok("${LOOP}".to_string())
            }
        }
        assert_eq!(resolve_placeholders("${X}", &Literal).unwrap(), "${LOOP}");
    }

    #[test]
    fn unclosed_placeholder_is_an_error() {
        assert!(resolve_placeholders("${UNCLOSED", &DefaultSecretResolver).is_err());
    }

    #[test]
    fn missing_env_var_is_not_found() {
        let err = resolve_placeholders("${CRUDKIT_TEST_SURELY_UNSET}", &DefaultSecretResolver)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn resolves_file_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("password");
        std::fs::write(&secret, "from-file\n").unwrap();

        let reference = format!("${{file:{}}}", secret.display());
        assert_eq!(resolve_placeholders(&reference, &DefaultSecretResolver).unwrap(), "from-file");
    }
}
