// Domain errors - Error types for the domain layer

use serde::Serialize;
use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Source metadata could not be read or is outside the supported domain
    ProbeFailure(String),
    /// A segment's sub-range could not be decoded
    ExtractionFailure { index: usize, message: String },
    /// A segment's output could not be written
    EncodeFailure { index: usize, message: String },
    /// File system operation failed
    FsFail(String),
    /// Configuration could not be loaded or is invalid
    ConfigFail(String),
}

/// Stable, reportable name of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadArgs,
    ProbeFailure,
    ExtractionFailure,
    EncodeFailure,
    FsFail,
    ConfigFail,
}

impl DomainError {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::BadArgs(_) => ErrorKind::BadArgs,
            DomainError::ProbeFailure(_) => ErrorKind::ProbeFailure,
            DomainError::ExtractionFailure { .. } => ErrorKind::ExtractionFailure,
            DomainError::EncodeFailure { .. } => ErrorKind::EncodeFailure,
            DomainError::FsFail(_) => ErrorKind::FsFail,
            DomainError::ConfigFail(_) => ErrorKind::ConfigFail,
        }
    }

    /// Segment index the error is attached to, if any
    pub fn segment_index(&self) -> Option<usize> {
        match self {
            DomainError::ExtractionFailure { index, .. } | DomainError::EncodeFailure { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    /// Re-tag an error raised while decoding segment `index`.
    ///
    /// Errors that already carry a segment kind are kept as they are.
    pub fn into_extraction(self, index: usize) -> Self {
        match self {
            DomainError::ExtractionFailure { .. } | DomainError::EncodeFailure { .. } => self,
            other => DomainError::ExtractionFailure {
                index,
                message: other.message(),
            },
        }
    }

    /// Re-tag an error raised while writing segment `index`.
    pub fn into_encode(self, index: usize) -> Self {
        match self {
            DomainError::EncodeFailure { .. } => self,
            other => DomainError::EncodeFailure {
                index,
                message: other.message(),
            },
        }
    }

    /// The bare message without the kind prefix
    pub fn message(&self) -> String {
        match self {
            DomainError::BadArgs(msg)
            | DomainError::ProbeFailure(msg)
            | DomainError::FsFail(msg)
            | DomainError::ConfigFail(msg) => msg.clone(),
            DomainError::ExtractionFailure { message, .. }
            | DomainError::EncodeFailure { message, .. } => message.clone(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::BadArgs => "bad_args",
            ErrorKind::ProbeFailure => "probe_failure",
            ErrorKind::ExtractionFailure => "extraction_failure",
            ErrorKind::EncodeFailure => "encode_failure",
            ErrorKind::FsFail => "fs_fail",
            ErrorKind::ConfigFail => "config_fail",
        };
        f.write_str(name)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::ProbeFailure(msg) => write!(f, "Probe failed: {}", msg),
            DomainError::ExtractionFailure { index, message } => {
                write!(f, "Extraction of segment {} failed: {}", index, message)
            }
            DomainError::EncodeFailure { index, message } => {
                write!(f, "Encoding of segment {} failed: {}", index, message)
            }
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::ConfigFail(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
