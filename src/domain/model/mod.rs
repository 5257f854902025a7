// Domain models - Core types and data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::errors::DomainError;

/// Target aspect ratio of every generated short (width / height)
pub const TARGET_ASPECT_RATIO: f64 = 9.0 / 16.0;

/// Default length of one short in seconds
pub const DEFAULT_SEGMENT_LENGTH: f64 = 60.0;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        // Try parsing as seconds (float)
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err(DomainError::BadArgs("Time must be a finite number".to_string()));
            }
            if seconds < 0.0 {
                return Err(DomainError::BadArgs("Time cannot be negative".to_string()));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs("Invalid minutes format".to_string()))?;
                let seconds = Self::parse_seconds_part(seconds)?;
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = hours
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs("Invalid hours format".to_string()))?;
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs("Invalid minutes format".to_string()))?;
                if minutes >= 60 {
                    return Err(DomainError::BadArgs("Minutes must be less than 60".to_string()));
                }
                let seconds = Self::parse_seconds_part(seconds)?;
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(DomainError::BadArgs(
                "Invalid time format. Supported formats: seconds (e.g., 45.5), MM:SS.ms (e.g., 1:30), HH:MM:SS.ms (e.g., 1:02:30.5)".to_string(),
            )),
        }
    }

    fn parse_seconds_part(part: &str) -> Result<f64, DomainError> {
        let seconds = part
            .parse::<f64>()
            .map_err(|_| DomainError::BadArgs("Invalid seconds format".to_string()))?;
        if !(0.0..60.0).contains(&seconds) {
            return Err(DomainError::BadArgs("Seconds must be less than 60".to_string()));
        }
        Ok(seconds)
    }

    /// Format as HH:MM:SS.mmm, or MM:SS.mmm below one hour
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Immutable description of a probed, decodable source video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceMedia {
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Average frame rate, when the container reports one
    pub frame_rate: Option<f64>,
    pub has_audio: bool,
}

impl SourceMedia {
    /// Create new source media with validation
    pub fn new(
        path: impl Into<PathBuf>,
        duration: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, DomainError> {
        let path = path.into();
        if !duration.is_finite() || duration < 0.0 {
            return Err(DomainError::ProbeFailure(format!(
                "Invalid duration {} for {}",
                duration,
                path.display()
            )));
        }
        if width == 0 || height == 0 {
            return Err(DomainError::ProbeFailure(format!(
                "Video dimensions cannot be zero ({}x{}) for {}",
                width,
                height,
                path.display()
            )));
        }

        Ok(Self {
            path,
            duration,
            width,
            height,
            frame_rate: None,
            has_audio: false,
        })
    }

    pub fn with_frame_rate(mut self, frame_rate: Option<f64>) -> Self {
        self.frame_rate = frame_rate.filter(|rate| rate.is_finite() && *rate > 0.0);
        self
    }

    pub fn with_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }

    /// Get aspect ratio
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// File stem used to name the generated shorts
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "source".to_string())
    }
}

/// A contiguous time window selected for extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    /// 1-based position in the planning tier
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(index: usize, start: f64, end: f64) -> Self {
        Self { index, start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Deterministic output name, `<base>_part<index>.<extension>`
    pub fn output_name(&self, base: &str, extension: &str) -> String {
        format!("{}_part{}.{}", base, self.index, extension)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{} - {}]",
            self.index,
            TimeSpec::from_seconds(self.start),
            TimeSpec::from_seconds(self.end)
        )
    }
}

/// Crop rectangle in source pixel coordinates, kept in floating point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Check the rectangle lies inside a `source_width` x `source_height` frame
    pub fn is_contained_in(&self, source_width: u32, source_height: u32) -> bool {
        const EPSILON: f64 = 1e-9;
        self.x >= -EPSILON
            && self.y >= -EPSILON
            && self.x + self.width <= source_width as f64 + EPSILON
            && self.y + self.height <= source_height as f64 + EPSILON
    }
}

/// Crop rectangle snapped to whole pixels, as handed to the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Round a crop to the nearest pixels, clamped to `[0, dimension]` on both axes
    pub fn from_crop(crop: &CropRect, source_width: u32, source_height: u32) -> Self {
        let (x, width) = Self::snap_axis(crop.x, crop.width, source_width);
        let (y, height) = Self::snap_axis(crop.y, crop.height, source_height);
        Self { x, y, width, height }
    }

    fn snap_axis(offset: f64, length: f64, dimension: u32) -> (u32, u32) {
        let length = (length.round().max(1.0) as u32).min(dimension);
        let offset = (offset.round().max(0.0) as u32).min(dimension - length);
        (offset, length)
    }

    /// Floor width and height to even values for 4:2:0 chroma subsampling
    pub fn aligned_even(&self) -> Self {
        let even = |value: u32| if value >= 2 { value & !1 } else { value };
        Self {
            x: self.x,
            y: self.y,
            width: even(self.width),
            height: even(self.height),
        }
    }

    /// FFmpeg `crop` filter expression for this rectangle
    pub fn filter_spec(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// One successfully written short
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDescriptor {
    pub index: usize,
    pub filename: String,
    pub path: PathBuf,
    pub start: f64,
    pub end: f64,
    /// Size of the written file in bytes
    pub bytes: u64,
}

impl OutputDescriptor {
    pub fn new(segment: &Segment, path: &Path, bytes: u64) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            index: segment.index,
            filename,
            path: path.to_path_buf(),
            start: segment.start,
            end: segment.end,
            bytes,
        }
    }
}

#[cfg(test)]
mod tests;
