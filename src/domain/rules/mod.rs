// Domain rules - Segment selection and vertical re-framing policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Sources longer than this skip their opening seconds in the three-segment tier
const INTRO_SKIP_THRESHOLD: f64 = 70.0;

/// Seconds skipped at the start of long sources
const INTRO_SKIP: f64 = 10.0;

/// Fractional anchors of the second and third window in the three-segment tier
const MIDDLE_ANCHOR: f64 = 0.33;
const LATE_ANCHOR: f64 = 0.66;

/// Business rules for choosing which windows of a source become shorts
pub struct SegmentPlanner;

impl SegmentPlanner {
    /// Plan the windows to extract from a source of `duration` seconds.
    ///
    /// The policy is a three-tier decision table on the duration:
    ///
    /// * shorter than one segment: the whole source as a single window
    /// * shorter than three segments: the opening window plus one centred on
    ///   the midpoint (the two may overlap)
    /// * otherwise: three windows anchored after the intro, at 33% and at 66%
    ///
    /// Every window is clamped to the source and dropped if it ends up empty.
    /// Indices follow the tier position and are not renumbered after a drop.
    pub fn plan(duration: f64, segment_length: f64) -> Vec<Segment> {
        let starts = Self::tier_starts(duration, segment_length);

        starts
            .into_iter()
            .enumerate()
            .filter_map(|(position, start)| {
                let end = (start + segment_length).min(duration);
                if start >= end {
                    return None;
                }
                Some(Segment::new(position + 1, start, end))
            })
            .collect()
    }

    fn tier_starts(duration: f64, segment_length: f64) -> Vec<f64> {
        if duration < segment_length {
            vec![0.0]
        } else if duration < segment_length * 3.0 {
            vec![0.0, duration / 2.0 - segment_length / 2.0]
        } else {
            let intro = if duration > INTRO_SKIP_THRESHOLD { INTRO_SKIP } else { 0.0 };
            vec![intro, duration * MIDDLE_ANCHOR, duration * LATE_ANCHOR]
        }
    }

    /// Reject segment lengths the planner is not defined for
    pub fn validate_length(segment_length: f64) -> Result<f64, DomainError> {
        if !segment_length.is_finite() || segment_length <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Segment length must be a positive number of seconds, got {}",
                segment_length
            )));
        }
        Ok(segment_length)
    }
}

/// Business rules for converting a source frame to the 9:16 target
pub struct CropGeometry;

impl CropGeometry {
    /// Centered crop converting a `width` x `height` frame to 9:16.
    ///
    /// Wider sources keep their full height and lose equal margins left and
    /// right; narrower or equal sources keep their full width and lose equal
    /// margins top and bottom. Nothing is ever padded.
    pub fn compute(width: u32, height: u32) -> CropRect {
        let width = width as f64;
        let height = height as f64;
        let current_ratio = width / height;

        if current_ratio > TARGET_ASPECT_RATIO {
            let new_width = height * TARGET_ASPECT_RATIO;
            CropRect {
                x: (width - new_width) / 2.0,
                y: 0.0,
                width: new_width,
                height,
            }
        } else {
            let new_height = width / TARGET_ASPECT_RATIO;
            CropRect {
                x: 0.0,
                y: (height - new_height) / 2.0,
                width,
                height: new_height,
            }
        }
    }

    /// Pixel rectangle handed to the encoder for a source of the given size
    pub fn pixel_rect(width: u32, height: u32) -> PixelRect {
        PixelRect::from_crop(&Self::compute(width, height), width, height).aligned_even()
    }
}

/// Plan the windows for a source (see [`SegmentPlanner::plan`])
pub fn plan_segments(duration: f64, segment_length: f64) -> Vec<Segment> {
    SegmentPlanner::plan(duration, segment_length)
}

/// Compute the 9:16 center crop for a frame (see [`CropGeometry::compute`])
pub fn compute_crop(width: u32, height: u32) -> CropRect {
    CropGeometry::compute(width, height)
}
