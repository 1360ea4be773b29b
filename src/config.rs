use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::api_client::DEFAULT_API_URL;
use crate::models::DEFAULT_DOCTOR_ID;

/// Environment variable selecting the backend base URL
pub const API_URL_ENV: &str = "CONSULT_API_URL";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,
    pub api_base_url: String,
    pub doctor_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            api_base_url: DEFAULT_API_URL.to_string(),
            doctor_id: DEFAULT_DOCTOR_ID.to_string(),
        }
    }
}

impl Config {
    /// Get the default config directory
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".consultportal"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file or return default
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                debug!("Failed to load config, using default: {}", e);
                Self::default()
            }
        }
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a file, or the default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to a file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Backend URL: command-line flag, then environment, then config file
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> String {
        if let Some(url) = cli_override.filter(|u| !u.trim().is_empty()) {
            return url.trim().to_string();
        }
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.api_base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.doctor_id, DEFAULT_DOCTOR_ID);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_base_url: "https://clinic.example.org".to_string(),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url":"http://10.0.0.5:8000"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, "http://10.0.0.5:8000");
        assert_eq!(loaded.doctor_id, DEFAULT_DOCTOR_ID);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_resolve_api_url_precedence() {
        let config = Config {
            api_base_url: "http://from-file:8000".to_string(),
            ..Default::default()
        };

        std::env::remove_var(API_URL_ENV);
        assert_eq!(config.resolve_api_url(None), "http://from-file:8000");

        std::env::set_var(API_URL_ENV, "http://from-env:8000");
        assert_eq!(config.resolve_api_url(None), "http://from-env:8000");
        assert_eq!(
            config.resolve_api_url(Some("http://from-flag:8000")),
            "http://from-flag:8000"
        );
        assert_eq!(config.resolve_api_url(Some("  ")), "http://from-env:8000");

        std::env::remove_var(API_URL_ENV);
    }
}
