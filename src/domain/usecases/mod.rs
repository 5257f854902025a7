// Domain use cases - Request and response contracts of the shorts use case

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::{CropGeometry, SegmentPlanner};

/// Request to turn one local source video into vertical shorts
#[derive(Debug, Clone, PartialEq)]
pub struct ShortsRequest {
    pub input: PathBuf,
    /// Overrides the configured output directory
    pub output_dir: Option<PathBuf>,
    /// Overrides the configured segment length (seconds)
    pub segment_length: Option<f64>,
}

impl ShortsRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: None,
            segment_length: None,
        }
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_segment_length(mut self, segment_length: Option<f64>) -> Self {
        self.segment_length = segment_length;
        self
    }
}

/// Result of a successful shorts run
#[derive(Debug, Clone, Serialize)]
pub struct ShortsResponse {
    pub source: SourceMedia,
    pub crop: PixelRect,
    pub segment_length: f64,
    /// Every window the planner produced, in tier order
    pub planned: Vec<Segment>,
    /// Written shorts, ascending segment index
    pub outputs: Vec<OutputDescriptor>,
    pub generated_at: DateTime<Utc>,
    pub processing_seconds: f64,
}

impl ShortsResponse {
    /// File names of the written shorts
    pub fn videos(&self) -> Vec<String> {
        self.outputs.iter().map(|o| o.filename.clone()).collect()
    }

    pub fn message(&self) -> String {
        if self.outputs.is_empty() {
            "No videos generated: the source is empty".to_string()
        } else {
            "Videos generated successfully!".to_string()
        }
    }

    /// Wire representation of this response
    pub fn envelope(&self) -> ShortsEnvelope {
        ShortsEnvelope::Success {
            videos: self.videos(),
            message: self.message(),
            details: Some(self.clone()),
        }
    }
}

/// JSON envelope reported to callers, `{"status": "success" | "error", ...}`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShortsEnvelope {
    Success {
        videos: Vec<String>,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<ShortsResponse>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl From<&DomainError> for ShortsEnvelope {
    fn from(error: &DomainError) -> Self {
        ShortsEnvelope::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Dry-run result of planning and geometry for a source
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub segment_length: f64,
    pub crop: CropRect,
    pub pixel_crop: PixelRect,
    pub segments: Vec<Segment>,
}

impl PlanReport {
    /// Plan a source of the given shape without touching any media
    pub fn build(duration: f64, width: u32, height: u32, segment_length: f64) -> Result<Self, DomainError> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(DomainError::BadArgs(format!("Invalid duration: {}", duration)));
        }
        if width == 0 || height == 0 {
            return Err(DomainError::BadArgs(format!("Invalid frame size: {}x{}", width, height)));
        }
        let segment_length = SegmentPlanner::validate_length(segment_length)?;

        Ok(Self {
            duration,
            width,
            height,
            segment_length,
            crop: CropGeometry::compute(width, height),
            pixel_crop: CropGeometry::pixel_rect(width, height),
            segments: SegmentPlanner::plan(duration, segment_length),
        })
    }

    /// Plan an already probed source
    pub fn for_media(media: &SourceMedia, segment_length: f64) -> Result<Self, DomainError> {
        Self::build(media.duration, media.width, media.height, segment_length)
    }
}
