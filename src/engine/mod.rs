//! Core shorts engine module

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

pub mod emitter;

pub use emitter::ClipEmitter;

/// Highest CRF accepted by x264
pub const MAX_CRF: u8 = 51;

/// Encoder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Video encoder name (FFmpeg naming)
    pub video_codec: String,
    /// Encoding preset
    pub preset: String,
    /// Constant Rate Factor (0-51)
    pub crf: u8,
    /// Encoder threads
    pub threads: usize,
    /// Pass the source audio through
    pub audio: bool,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            crf: 23,
            threads: 4,
            audio: true,
        }
    }
}

impl EncoderSettings {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.video_codec.trim().is_empty() {
            return Err(DomainError::ConfigFail("Video codec cannot be empty".to_string()));
        }
        if self.preset.trim().is_empty() {
            return Err(DomainError::ConfigFail("Encoding preset cannot be empty".to_string()));
        }
        if self.crf > MAX_CRF {
            return Err(DomainError::ConfigFail(format!(
                "CRF value {} is invalid (must be 0-{})",
                self.crf, MAX_CRF
            )));
        }
        if self.threads == 0 {
            return Err(DomainError::ConfigFail("Encoder threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// What to do when a short with the same name already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Replace the existing file
    #[default]
    Always,
    /// Fail the segment instead of replacing
    Never,
}

impl OverwritePolicy {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value.trim().to_lowercase().as_str() {
            "always" => Ok(OverwritePolicy::Always),
            "never" => Ok(OverwritePolicy::Never),
            other => Err(DomainError::BadArgs(format!(
                "Invalid overwrite policy: {}. Valid policies: always, never",
                other
            ))),
        }
    }
}
