// Probe LibAV adapter - Source metadata using libav

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::error::VertixError;
use crate::ports::*;
use ffmpeg_next as ffmpeg;
use std::path::Path;
use tracing::debug;

/// Extensions the batch discovery treats as video sources
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm", "ts", "mts", "m2ts"];

/// LibAV-based media probing adapter
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    /// Create new LibAV probing adapter
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg::init().map_err(|e| DomainError::from(VertixError::from(e)))?;
        Ok(Self)
    }

    /// Check if a path carries a supported video extension
    pub fn is_supported_format(file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Container duration, falling back to the video stream's own duration
    fn duration_seconds(input: &ffmpeg::format::context::Input, stream: &ffmpeg::Stream) -> Option<f64> {
        let container = input.duration();
        if container > 0 {
            return Some(container as f64 / f64::from(ffmpeg::ffi::AV_TIME_BASE));
        }

        let stream_duration = stream.duration();
        if stream_duration > 0 {
            return Some(stream_duration as f64 * f64::from(stream.time_base()));
        }

        None
    }
}

impl ProbePort for ProbeLibavAdapter {
    fn probe(&self, file_path: &Path) -> Result<SourceMedia, DomainError> {
        if !file_path.exists() {
            return Err(DomainError::ProbeFailure(format!(
                "File does not exist: {}",
                file_path.display()
            )));
        }

        let input = ffmpeg::format::input(&file_path).map_err(|e| {
            DomainError::ProbeFailure(format!("Failed to open {}: {}", file_path.display(), e))
        })?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| DomainError::ProbeFailure(format!("No video stream in {}", file_path.display())))?;

        let decoder = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|e| DomainError::ProbeFailure(format!("Failed to read video parameters: {}", e)))?;

        let duration = Self::duration_seconds(&input, &stream).ok_or_else(|| {
            DomainError::ProbeFailure(format!("Could not determine duration of {}", file_path.display()))
        })?;

        let rate = stream.avg_frame_rate();
        let frame_rate = if rate.denominator() != 0 && rate.numerator() > 0 {
            Some(f64::from(rate))
        } else {
            None
        };
        let has_audio = input.streams().best(ffmpeg::media::Type::Audio).is_some();

        debug!(
            "Probed {}: {:.3}s, {}x{}, {:?} fps, audio: {}",
            file_path.display(),
            duration,
            decoder.width(),
            decoder.height(),
            frame_rate,
            has_audio
        );

        Ok(SourceMedia::new(file_path, duration, decoder.width(), decoder.height())?
            .with_frame_rate(frame_rate)
            .with_audio(has_audio))
    }
}
