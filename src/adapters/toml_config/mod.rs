// TOML config adapter - Configuration management using TOML files

use crate::config_initialization::AppConfig;
use crate::domain::errors::*;
use crate::error::VertixError;
use crate::ports::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    config_file_path: PathBuf,
}

impl TomlConfigAdapter {
    /// Create an adapter reading and writing `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config_file_path: path.into(),
        }
    }

    /// Serialize config to TOML string
    pub fn serialize_config(config: &AppConfig) -> Result<String, DomainError> {
        toml::to_string_pretty(config).map_err(|e| VertixError::from(e).into())
    }

    /// Deserialize config from TOML string
    pub fn deserialize_config(&self, toml_content: &str) -> Result<AppConfig, DomainError> {
        toml::from_str(toml_content).map_err(|source| {
            VertixError::ConfigParse {
                path: self.config_file_path.display().to_string(),
                source,
            }
            .into()
        })
    }
}

impl ConfigPort for TomlConfigAdapter {
    fn load_config(&self) -> Result<AppConfig, DomainError> {
        let path = &self.config_file_path;
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::FsFail(format!("Failed to read config file: {}", e)))?;
        self.deserialize_config(&content)
    }

    fn save_config(&self, config: &AppConfig) -> Result<(), DomainError> {
        let path = &self.config_file_path;

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::FsFail(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = Self::serialize_config(config)?;
        std::fs::write(path, content)
            .map_err(|e| DomainError::FsFail(format!("Failed to write config file: {}", e)))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    fn config_file_path(&self) -> &Path {
        &self.config_file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OverwritePolicy;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let adapter = TomlConfigAdapter::new(dir.path().join("vertix.toml"));
        assert_eq!(adapter.load_config().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let adapter = TomlConfigAdapter::new(dir.path().join("nested").join("vertix.toml"));

        let mut config = AppConfig::default();
        config.segment_length = 45.0;
        config.overwrite = OverwritePolicy::Never;
        config.encoder.crf = 30;
        adapter.save_config(&config).unwrap();

        let written = std::fs::read_to_string(adapter.config_file_path()).unwrap();
        assert!(written.contains("overwrite = \"never\""));
        assert!(written.contains("[encoder]"));
        assert_eq!(adapter.load_config().unwrap(), config);
    }

    #[test]
    fn test_parse_error_is_config_fail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vertix.toml");
        std::fs::write(&path, "segment_length = \"long\"").unwrap();

        let err = TomlConfigAdapter::new(&path).load_config().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigFail);
        assert!(err.to_string().contains("vertix.toml"));
    }
}
