use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::Strictness;
use crate::models::{DemoSettings, ValidationError};

const CONFIG_DIR_NAME: &str = "healthmonitor";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Application configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial demo switches
    pub demo: DemoSettings,

    /// Login and OTP checking
    pub auth: AuthConfig,

    /// Logging output
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub strictness: Strictness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one the default location is used
    /// when present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Configuration file not found: {}", path.display());
                }
                Self::load_from_file(path)?
            }
            None => match Self::default_path() {
                Some(default_path) if default_path.exists() => Self::load_from_file(&default_path)?,
                _ => Self::default(),
            },
        };

        config
            .validate()
            .map_err(|errors| anyhow::anyhow!("Invalid configuration: {}", join_errors(&errors)))?;

        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ValidationError::InvalidFormat {
                field: "logging.level".to_string(),
                reason: format!("expected one of {:?}, got '{}'", LOG_LEVELS, self.logging.level),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Log level for the tracing subscriber
    pub fn log_level(&self) -> tracing::Level {
        self.logging
            .level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.demo, DemoSettings::default());
        assert_eq!(config.auth.strictness, Strictness::Strict);
        assert_eq!(config.log_level(), tracing::Level::INFO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[demo]
fast_mode = true
force_network_issue = true

[auth]
strictness = "permissive"

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert!(config.demo.fast_mode);
        assert!(config.demo.force_network_issue);
        assert!(!config.demo.force_upload_failure);
        assert_eq!(config.auth.strictness, Strictness::Permissive);
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AppConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"loud\"").unwrap();

        let error = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(error.to_string().contains("logging.level"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[demo\nfast_mode = ").unwrap();
        assert!(AppConfig::load(Some(file.path())).is_err());
    }
}
