//! Configuration types for the row action engine

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration for the row action engine and its host harness
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RowActionsConfig {
    /// Where RLS attributes are read from
    pub attributes: AttributeConfig,
    /// Host harness logging
    pub logging: LoggingConfig,
}

impl RowActionsConfig {
    /// Parse a configuration from TOML text
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the text is not valid TOML for this shape.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Load a configuration file, falling back to defaults when it does not exist
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Attribute source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    /// Key of the host-injected attribute object (default: "rls_extra_rules")
    pub global_key: String,
    /// Storage key holding the bearer token (default: "access_token")
    pub token_storage_key: String,
    /// Claim inside the token payload holding the attributes (default: "rls_extra_rules")
    pub token_claim: String,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            global_key: "rls_extra_rules".to_string(),
            token_storage_key: "access_token".to_string(),
            token_claim: "rls_extra_rules".to_string(),
        }
    }
}

/// Logging configuration for the host harness
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON-formatted log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RowActionsConfig::default();
        assert_eq!(config.attributes.global_key, "rls_extra_rules");
        assert_eq!(config.attributes.token_storage_key, "access_token");
        assert_eq!(config.attributes.token_claim, "rls_extra_rules");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_partial_toml() {
        let config = RowActionsConfig::from_toml_str(
            r#"
[attributes]
token_storage_key = "jwt"

[logging]
json = true
"#,
        )
        .unwrap();

        assert_eq!(config.attributes.token_storage_key, "jwt");
        assert_eq!(config.attributes.token_claim, "rls_extra_rules");
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml() {
        let err = RowActionsConfig::from_toml_str("[attributes\n").unwrap_err();
        assert_eq!(err.error_code(), "config_error");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RowActionsConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.attributes.token_storage_key, "access_token");
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = RowActionsConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
    }
}
