//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory, used when none is given on the command line
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// The command-line directory if given, else the configured one
    pub fn cache_directory(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.cache.directory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert!(config.cache.directory.is_none());
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cachectl.toml");
        std::fs::write(
            &path,
            "[cache]\ndirectory = \"/var/cache/xml\"\n\n[logging]\nformat = \"JSON\"\n",
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.cache.directory, Some(PathBuf::from("/var/cache/xml")));
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cachectl.toml");
        std::fs::write(&path, "[cache\n").unwrap();

        assert!(Config::load(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_cache_directory_precedence() {
        let mut config = Config::default();
        assert_eq!(config.cache_directory(None), None);

        config.cache.directory = Some(PathBuf::from("/configured"));
        assert_eq!(config.cache_directory(None), Some(PathBuf::from("/configured")));
        assert_eq!(
            config.cache_directory(Some(PathBuf::from("/cli"))),
            Some(PathBuf::from("/cli"))
        );
    }
}
