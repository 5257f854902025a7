// Unit tests for domain models

use super::*;
use crate::domain::errors::*;

#[test]
fn test_time_spec_parse_seconds() {
    let time = TimeSpec::parse("45.5").unwrap();
    assert_eq!(time.seconds, 45.5);
}

#[test]
fn test_time_spec_parse_mm_ss() {
    let time = TimeSpec::parse("01:30.5").unwrap();
    assert_eq!(time.seconds, 90.5);
}

#[test]
fn test_time_spec_parse_hh_mm_ss() {
    let time = TimeSpec::parse("01:02:03.5").unwrap();
    assert_eq!(time.seconds, 3723.5);
}

#[test]
fn test_time_spec_parse_invalid() {
    assert!(TimeSpec::parse("invalid").is_err());
    assert!(TimeSpec::parse("00:60").is_err());
    assert!(TimeSpec::parse("1:60:00").is_err());
    assert!(TimeSpec::parse("-10").is_err());
    assert!(TimeSpec::parse("inf").is_err());
    assert!(TimeSpec::parse("1:2:3:4").is_err());
}

#[test]
fn test_time_spec_display() {
    assert_eq!(TimeSpec::from_seconds(3723.456).to_string(), "01:02:03.456");
    assert_eq!(TimeSpec::from_seconds(123.456).to_string(), "02:03.456");
    assert_eq!(TimeSpec::from_seconds(59.9996).to_string(), "01:00.000");
}

#[test]
fn test_source_media_validation() {
    let media = SourceMedia::new("in/clip.mp4", 120.0, 1920, 1080).unwrap();
    assert_eq!(media.aspect_ratio(), 16.0 / 9.0);
    assert!(!media.has_audio);

    assert!(matches!(
        SourceMedia::new("a.mp4", -1.0, 1920, 1080),
        Err(DomainError::ProbeFailure(_))
    ));
    assert!(SourceMedia::new("a.mp4", f64::NAN, 1920, 1080).is_err());
    assert!(SourceMedia::new("a.mp4", 10.0, 0, 1080).is_err());
    assert!(SourceMedia::new("a.mp4", 10.0, 1920, 0).is_err());
    assert!(SourceMedia::new("a.mp4", 0.0, 2, 2).is_ok());
}

#[test]
fn test_source_media_frame_rate_filters_garbage() {
    let media = SourceMedia::new("a.mp4", 10.0, 640, 360).unwrap();
    assert_eq!(media.clone().with_frame_rate(Some(29.97)).frame_rate, Some(29.97));
    assert_eq!(media.clone().with_frame_rate(Some(0.0)).frame_rate, None);
    assert_eq!(media.with_frame_rate(Some(f64::NAN)).frame_rate, None);
}

#[test]
fn test_base_name_uses_file_stem() {
    let media = SourceMedia::new("/downloads/dQw4w9WgXcQ.webm", 10.0, 640, 360).unwrap();
    assert_eq!(media.base_name(), "dQw4w9WgXcQ");

    let media = SourceMedia::new("/", 10.0, 640, 360).unwrap();
    assert_eq!(media.base_name(), "source");
}

#[test]
fn test_segment_output_name() {
    let segment = Segment::new(2, 20.0, 80.0);
    assert_eq!(segment.output_name("abc", "mp4"), "abc_part2.mp4");
    assert_eq!(segment.duration(), 60.0);
}

#[test]
fn test_pixel_rect_rounds_and_clamps() {
    let crop = CropRect { x: 656.25, y: 0.0, width: 607.5, height: 1080.0 };
    let rect = PixelRect::from_crop(&crop, 1920, 1080);
    assert_eq!(rect, PixelRect { x: 656, y: 0, width: 608, height: 1080 });

    // Rounding up would overshoot the right edge; the offset is pulled back
    let crop = CropRect { x: 10.6, y: 0.0, width: 9.5, height: 20.0 };
    let rect = PixelRect::from_crop(&crop, 20, 20);
    assert_eq!(rect.width, 10);
    assert_eq!(rect.x, 10);
}

#[test]
fn test_pixel_rect_even_alignment() {
    let rect = PixelRect { x: 3, y: 1, width: 361, height: 641 }.aligned_even();
    assert_eq!(rect, PixelRect { x: 3, y: 1, width: 360, height: 640 });

    let tiny = PixelRect { x: 0, y: 0, width: 1, height: 1 }.aligned_even();
    assert_eq!((tiny.width, tiny.height), (1, 1));
}

#[test]
fn test_output_descriptor_from_segment() {
    let segment = Segment::new(3, 132.0, 192.0);
    let descriptor =
        OutputDescriptor::new(&segment, std::path::Path::new("processed/abc_part3.mp4"), 2048);
    assert_eq!(descriptor.index, 3);
    assert_eq!(descriptor.filename, "abc_part3.mp4");
    assert_eq!(descriptor.start, 132.0);
    assert_eq!(descriptor.end, 192.0);
    assert_eq!(descriptor.bytes, 2048);
}

#[test]
fn test_error_kinds_and_retagging() {
    let err = DomainError::BadArgs("boom".to_string()).into_extraction(2);
    assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
    assert_eq!(err.segment_index(), Some(2));
    assert_eq!(err.message(), "boom");

    let encode = DomainError::EncodeFailure { index: 1, message: "disk full".to_string() };
    assert_eq!(encode.clone().into_extraction(1), encode);
    assert_eq!(ErrorKind::EncodeFailure.to_string(), "encode_failure");
    assert_eq!(encode.to_string(), "Encoding of segment 1 failed: disk full");
}
