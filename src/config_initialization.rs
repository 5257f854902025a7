//! Configuration initialization and hierarchy management
//!
//! Precedence, lowest first: built-in defaults, the TOML file, `VERTIX_*`
//! environment variables, command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::adapters::toml_config::TomlConfigAdapter;
use crate::domain::errors::DomainError;
use crate::domain::model::DEFAULT_SEGMENT_LENGTH;
use crate::domain::rules::SegmentPlanner;
use crate::engine::{EncoderSettings, OverwritePolicy, MAX_CRF};
use crate::ports::ConfigPort;
use crate::utils::logging::{LogFormat, LogLevel, LoggingConfig};

/// Files probed, in order, when no `--config` is given
pub const CONFIG_SEARCH_PATHS: &[&str] = &["vertix.toml", "config/vertix.toml"];

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "VERTIX_";

/// Effective application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Length of every short, in seconds
    pub segment_length: f64,
    /// Directory the shorts are written to
    pub output_dir: PathBuf,
    /// Output container extension
    pub container: String,
    pub overwrite: OverwritePolicy,
    /// Upper bound on sources processed at once by `batch`
    pub max_concurrent_jobs: usize,
    pub encoder: EncoderSettings,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            segment_length: DEFAULT_SEGMENT_LENGTH,
            output_dir: PathBuf::from("processed"),
            container: "mp4".to_string(),
            overwrite: OverwritePolicy::default(),
            max_concurrent_jobs: default_concurrency(),
            encoder: EncoderSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Half the logical cores, at least one
fn default_concurrency() -> usize {
    (num_cpus::get() / 2).max(1)
}

/// Command-line values that win over every other layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub segment_length: Option<f64>,
    pub output_dir: Option<PathBuf>,
    pub container: Option<String>,
    pub overwrite: Option<OverwritePolicy>,
    pub max_concurrent_jobs: Option<usize>,
    pub preset: Option<String>,
    pub crf: Option<u8>,
    pub threads: Option<usize>,
    pub audio: Option<bool>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
}

impl AppConfig {
    /// Check every value against its documented domain
    pub fn validate(&self) -> Result<(), DomainError> {
        SegmentPlanner::validate_length(self.segment_length)
            .map_err(|e| DomainError::ConfigFail(e.message()))?;

        if self.output_dir.as_os_str().is_empty() {
            return Err(DomainError::ConfigFail("Output directory cannot be empty".to_string()));
        }
        if self.container.is_empty() || !self.container.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::ConfigFail(format!(
                "Invalid output container: '{}'",
                self.container
            )));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(DomainError::ConfigFail("max_concurrent_jobs must be at least 1".to_string()));
        }
        self.encoder.validate()
    }

    /// Apply `VERTIX_*` variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<usize, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut applied = 0;

        if let Some(value) = var("SEGMENT_LENGTH") {
            self.segment_length = parse_env("SEGMENT_LENGTH", &value)?;
            applied += 1;
        }
        if let Some(value) = var("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
            applied += 1;
        }
        if let Some(value) = var("CONTAINER") {
            self.container = value.trim().to_lowercase();
            applied += 1;
        }
        if let Some(value) = var("OVERWRITE") {
            self.overwrite = OverwritePolicy::parse(&value).map_err(|e| DomainError::ConfigFail(e.message()))?;
            applied += 1;
        }
        if let Some(value) = var("MAX_CONCURRENT_JOBS") {
            self.max_concurrent_jobs = parse_env("MAX_CONCURRENT_JOBS", &value)?;
            applied += 1;
        }
        if let Some(value) = var("VIDEO_CODEC") {
            self.encoder.video_codec = value;
            applied += 1;
        }
        if let Some(value) = var("PRESET") {
            self.encoder.preset = value;
            applied += 1;
        }
        if let Some(value) = var("CRF") {
            self.encoder.crf = parse_env("CRF", &value)?;
            applied += 1;
        }
        if let Some(value) = var("THREADS") {
            self.encoder.threads = parse_env("THREADS", &value)?;
            applied += 1;
        }
        if let Some(value) = var("AUDIO") {
            self.encoder.audio = parse_env("AUDIO", &value)?;
            applied += 1;
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.logging.level = LogLevel::parse(&value)?;
            applied += 1;
        }
        if let Some(value) = var("LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&value)?;
            applied += 1;
        }

        Ok(applied)
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(length) = overrides.segment_length {
            self.segment_length = length;
        }
        if let Some(dir) = &overrides.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(container) = &overrides.container {
            self.container = container.to_lowercase();
        }
        if let Some(policy) = overrides.overwrite {
            self.overwrite = policy;
        }
        if let Some(jobs) = overrides.max_concurrent_jobs {
            self.max_concurrent_jobs = jobs;
        }
        if let Some(preset) = &overrides.preset {
            self.encoder.preset = preset.clone();
        }
        if let Some(crf) = overrides.crf {
            self.encoder.crf = crf.min(MAX_CRF);
        }
        if let Some(threads) = overrides.threads {
            self.encoder.threads = threads;
        }
        if let Some(audio) = overrides.audio {
            self.encoder.audio = audio;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, DomainError> {
    value.trim().parse().map_err(|_| {
        DomainError::ConfigFail(format!("Invalid value for {}{}: '{}'", ENV_PREFIX, name, value))
    })
}

/// Pick the configuration file: the explicit one, else the first search path that exists
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    CONFIG_SEARCH_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

/// Configuration after all layers have been applied
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// File the file layer came from, if any
    pub source: Option<PathBuf>,
    pub env_overrides: usize,
}

/// Build the effective configuration
pub fn initialize_configuration(
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<LoadedConfig, DomainError> {
    initialize_configuration_with(explicit, overrides, |name| std::env::var(name).ok())
}

/// Same as [`initialize_configuration`] with an injectable environment
pub fn initialize_configuration_with<F>(
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
    lookup: F,
) -> Result<LoadedConfig, DomainError>
where
    F: Fn(&str) -> Option<String>,
{
    let source = resolve_config_path(explicit);
    let mut config = match &source {
        Some(path) => {
            if explicit.is_some() && !path.is_file() {
                return Err(DomainError::ConfigFail(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            info!("Loading configuration from: {}", path.display());
            TomlConfigAdapter::new(path).load_config()?
        }
        None => {
            debug!("No configuration file found, using defaults");
            AppConfig::default()
        }
    };

    let env_overrides = config.apply_env(lookup)?;
    if env_overrides > 0 {
        info!("Applied {} environment variable overrides", env_overrides);
    }
    config.apply_overrides(overrides);
    config.validate()?;

    Ok(LoadedConfig {
        config,
        source,
        env_overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segment_length, 60.0);
        assert_eq!(config.output_dir, PathBuf::from("processed"));
        assert_eq!(config.encoder.preset, "ultrafast");
        assert_eq!(config.encoder.threads, 4);
        assert!(config.max_concurrent_jobs >= 1);
    }

    #[test]
    fn test_precedence_file_env_cli() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vertix.toml");
        std::fs::write(
            &path,
            "segment_length = 30.0\ncontainer = \"mkv\"\n[encoder]\ncrf = 18\npreset = \"fast\"\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            crf: Some(28),
            ..Default::default()
        };
        let loaded = initialize_configuration_with(
            Some(path.as_path()),
            &overrides,
            env(&[("VERTIX_SEGMENT_LENGTH", "45"), ("VERTIX_CRF", "20")]),
        )
        .unwrap();

        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.env_overrides, 2);
        // file
        assert_eq!(loaded.config.container, "mkv");
        assert_eq!(loaded.config.encoder.preset, "fast");
        // env over file
        assert_eq!(loaded.config.segment_length, 45.0);
        // cli over env
        assert_eq!(loaded.config.encoder.crf, 28);
        // untouched default
        assert_eq!(loaded.config.encoder.threads, 4);
    }

    #[test]
    fn test_missing_explicit_file_is_config_fail() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = initialize_configuration_with(Some(missing.as_path()), &ConfigOverrides::default(), env(&[]))
            .unwrap_err();
        assert!(matches!(err, DomainError::ConfigFail(_)));
    }

    #[test]
    fn test_invalid_env_value_is_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("VERTIX_THREADS", "many")])).unwrap_err();
        assert!(matches!(err, DomainError::ConfigFail(_)));

        let err = config.apply_env(env(&[("VERTIX_OVERWRITE", "sometimes")])).unwrap_err();
        assert!(matches!(err, DomainError::ConfigFail(_)));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = AppConfig {
            segment_length: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DomainError::ConfigFail(_))));

        let config = AppConfig {
            container: "mp4; rm".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            max_concurrent_jobs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_apply_log_settings() {
        let mut config = AppConfig::default();
        config.apply_overrides(&ConfigOverrides {
            log_level: Some(LogLevel::Debug),
            log_format: Some(LogFormat::Json),
            overwrite: Some(OverwritePolicy::Never),
            ..Default::default()
        });
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.overwrite, OverwritePolicy::Never);
    }
}
