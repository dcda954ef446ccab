//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be > 0".into(),
            ));
        }
        if self.server.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_upload_mb must be > 0".into(),
            ));
        }
        if self.llm.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "llm.timeout_ms must be > 0".into(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tokens must be > 0".into(),
            ));
        }
        if self.llm.dialect_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "llm.dialect_markers must contain at least one marker".into(),
            ));
        }
        if self.dataset.file_prefix.is_empty() || self.demo.file_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "dataset.file_prefix and demo.file_prefix must not be empty".into(),
            ));
        }
        if self.upload_dir() == self.output_dir() {
            return Err(ConfigError::ValidationError(
                "storage.upload_dir and storage.output_dir must differ".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.llm.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_validate_rejects_empty_markers() {
        let mut config = Config::default();
        config.llm.dialect_markers = vec![" ".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dialect_markers"));
    }

    #[test]
    fn test_validate_rejects_shared_directory() {
        let mut config = Config::default();
        config.storage.output_dir = PathBuf::from("uploads");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_validate_rejects_empty_prefix() {
        let mut config = Config::default();
        config.demo.file_prefix.clear();
        assert!(config.validate().is_err());
    }
}
