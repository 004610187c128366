//! Environment variable expansion for configuration strings.
//!
//! Credentials and relay passwords are usually kept out of `gradewatch.toml`
//! and injected through the environment:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand `${VAR}` references in a configuration value.
///
/// Values without `${` are returned as is, so a password containing a bare
/// `$` survives untouched.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    match shellexpand::env_with_context(value, lookup) {
        Ok(expanded) => Ok(expanded.into_owned()),
        Err(e) => Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.cause.0),
        }),
    }
}

fn lookup(var: &str) -> Result<Option<String>, UnsetVar> {
    std::env::var(var)
        .map(Some)
        .map_err(|_| UnsetVar(var.to_owned()))
}

/// Name of a referenced variable missing from the environment.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("GW_TEST_EXPAND_SIMPLE", "21z201");
        }
        let result = expand_env("${GW_TEST_EXPAND_SIMPLE}", "credentials.identifier").unwrap();
        assert_eq!(result, "21z201");
        unsafe {
            std::env::remove_var("GW_TEST_EXPAND_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("GW_TEST_EXPAND_UNSET");
        }
        let result = expand_env("${GW_TEST_EXPAND_UNSET:-smtp.example.com}", "mail.smtp_host")
            .unwrap();
        assert_eq!(result, "smtp.example.com");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("GW_TEST_EXPAND_MISSING");
        }
        let err = expand_env("${GW_TEST_EXPAND_MISSING}", "credentials.secret").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("GW_TEST_EXPAND_MISSING"));
        assert!(err.to_string().contains("credentials.secret"));
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("GW_TEST_EXPAND_HOST", "portal.example.edu");
        }
        let result = expand_env("https://${GW_TEST_EXPAND_HOST}/studzone", "portal.base_url")
            .unwrap();
        assert_eq!(result, "https://portal.example.edu/studzone");
        unsafe {
            std::env::remove_var("GW_TEST_EXPAND_HOST");
        }
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("pa$$word", "mail.password").unwrap();
        assert_eq!(result, "pa$$word");
    }
}
