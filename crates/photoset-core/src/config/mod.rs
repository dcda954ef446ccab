//! Configuration management for Photoset.
//!
//! Configuration is loaded from a TOML file in the platform config directory,
//! falling back to defaults when the file does not exist. Storage directories
//! live here rather than in globals so every component receives them
//! explicitly.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Photoset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Upload and output directories
    pub storage: StorageConfig,

    /// Vision API settings
    pub llm: LlmConfig,

    /// Training record settings
    pub dataset: DatasetConfig,

    /// Demo mode settings
    pub demo: DemoConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.photoset.photoset/config.toml
    /// - Linux: ~/.config/photoset/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\photoset\config\config.toml
    ///
    /// Falls back to ~/.photoset/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "photoset", "photoset")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".photoset").join("config.toml")
            })
    }

    /// Resolved upload directory (with ~ expansion).
    pub fn upload_dir(&self) -> PathBuf {
        expand(&self.storage.upload_dir)
    }

    /// Resolved output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.storage.output_dir)
    }

    /// Dataset file prefix for the current mode.
    pub fn file_prefix(&self) -> &str {
        if self.demo.enabled {
            &self.demo.file_prefix
        } else {
            &self.dataset.file_prefix
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.timeout_ms, 60_000);
        assert_eq!(config.llm.max_tokens, 500);
        assert!(!config.demo.enabled);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[storage]"));
        assert!(toml.contains("[llm]"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9100\n\n[demo]\nenabled = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.demo.enabled);
        assert_eq!(config.file_prefix(), "train_demo");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm]\ntimeout_ms = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = Config::default();
        config.storage.upload_dir = PathBuf::from("~/photoset/uploads");
        assert!(!config.upload_dir().to_string_lossy().starts_with('~'));
    }
}
