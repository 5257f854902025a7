//! Error handling module for Vertix

use thiserror::Error;

use crate::domain::errors::{DomainError, ErrorKind};

/// Main error type for Vertix operations outside the domain layer
#[derive(Error, Debug)]
pub enum VertixError {
    /// A domain failure surfaced unchanged
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    FFmpegError(#[from] ffmpeg_next::Error),
}

impl VertixError {
    /// Reportable kind, mapping host failures onto the domain kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            VertixError::Domain(e) => e.kind(),
            VertixError::ConfigParse { .. } | VertixError::ConfigSerialize(_) => ErrorKind::ConfigFail,
            VertixError::Join(_) => ErrorKind::FsFail,
            VertixError::FFmpegError(_) => ErrorKind::ProbeFailure,
        }
    }
}

impl From<VertixError> for DomainError {
    fn from(error: VertixError) -> Self {
        match error {
            VertixError::Domain(e) => e,
            other => {
                let message = other.to_string();
                match other.kind() {
                    ErrorKind::ConfigFail => DomainError::ConfigFail(message),
                    ErrorKind::ProbeFailure => DomainError::ProbeFailure(message),
                    _ => DomainError::FsFail(message),
                }
            }
        }
    }
}

/// Result type alias for Vertix operations
pub type VertixResult<T> = std::result::Result<T, VertixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_pass_through() {
        let error = VertixError::from(DomainError::EncodeFailure {
            index: 2,
            message: "disk full".to_string(),
        });
        assert_eq!(error.kind(), ErrorKind::EncodeFailure);
        assert_eq!(error.to_string(), "Encoding of segment 2 failed: disk full");

        let back: DomainError = error.into();
        assert_eq!(back.segment_index(), Some(2));
    }

    #[test]
    fn test_ffmpeg_errors_map_to_probe_failure() {
        let domain: DomainError = VertixError::from(ffmpeg_next::Error::Eof).into();
        assert_eq!(domain.kind(), ErrorKind::ProbeFailure);
        assert!(domain.message().starts_with("FFmpeg error"));
    }

    #[test]
    fn test_config_parse_errors_map_to_config_fail() {
        let source = toml::from_str::<toml::Table>("segment_length = ").unwrap_err();
        let error = VertixError::ConfigParse {
            path: "vertix.toml".to_string(),
            source,
        };
        assert_eq!(error.kind(), ErrorKind::ConfigFail);

        let domain: DomainError = error.into();
        assert_eq!(domain.kind(), ErrorKind::ConfigFail);
        assert!(domain.message().contains("vertix.toml"));
    }
}
