//! Clip emitter tests against in-memory decoder and sink doubles

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use vertix::domain::errors::{DomainError, ErrorKind};
use vertix::domain::model::{PixelRect, Segment, SourceMedia};
use vertix::domain::rules::plan_segments;
use vertix::engine::ClipEmitter;
use vertix::ports::{ClipSink, ClipWriter, MediaDecoder, SourceHandle};

// Test utilities

/// A decoded "frame": segment index and offset from the segment start
type Unit = (usize, f64);

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    releases: AtomicUsize,
}

struct MockDecoder {
    counters: Arc<Counters>,
    fail_open: bool,
    fail_extract_on: Option<usize>,
}

struct MockSource {
    counters: Arc<Counters>,
    fail_extract_on: Option<usize>,
}

impl MediaDecoder for MockDecoder {
    type Unit = Unit;
    type Source = MockSource;

    fn open(&self, media: &SourceMedia) -> Result<MockSource, DomainError> {
        if self.fail_open {
            return Err(DomainError::ProbeFailure(format!("cannot open {}", media.path.display())));
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(MockSource {
            counters: Arc::clone(&self.counters),
            fail_extract_on: self.fail_extract_on,
        })
    }
}

impl SourceHandle for MockSource {
    type Unit = Unit;

    fn extract(
        &mut self,
        segment: &Segment,
        consume: &mut dyn FnMut(Unit) -> Result<(), DomainError>,
    ) -> Result<(), DomainError> {
        if self.fail_extract_on == Some(segment.index) {
            return Err(DomainError::BadArgs("corrupt packet".to_string()));
        }
        for frame in 0..3 {
            consume((segment.index, frame as f64 / 30.0))?;
        }
        Ok(())
    }

    fn release(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct MockSink {
    fail_write_on: Option<String>,
    crops: Arc<Mutex<Vec<PixelRect>>>,
    finished: Arc<Mutex<Vec<PathBuf>>>,
}

struct MockWriter {
    output: PathBuf,
    fail: bool,
    units: Vec<Unit>,
    finished: Arc<Mutex<Vec<PathBuf>>>,
}

impl ClipSink for MockSink {
    type Unit = Unit;
    type Writer = MockWriter;

    fn create(&self, _media: &SourceMedia, crop: &PixelRect, output: &Path) -> Result<MockWriter, DomainError> {
        self.crops.lock().unwrap().push(*crop);
        let name = output.file_name().unwrap().to_string_lossy().to_string();
        Ok(MockWriter {
            output: output.to_path_buf(),
            fail: self.fail_write_on.as_deref() == Some(name.as_str()),
            units: Vec::new(),
            finished: Arc::clone(&self.finished),
        })
    }
}

impl ClipWriter for MockWriter {
    type Unit = Unit;

    fn write(&mut self, unit: Unit) -> Result<(), DomainError> {
        if self.fail {
            return Err(DomainError::FsFail("disk full".to_string()));
        }
        self.units.push(unit);
        Ok(())
    }

    fn finish(self) -> Result<u64, DomainError> {
        let bytes = vec![0u8; self.units.len() * 100];
        std::fs::write(&self.output, &bytes).map_err(|e| DomainError::FsFail(e.to_string()))?;
        self.finished.lock().unwrap().push(self.output.clone());
        Ok(bytes.len() as u64)
    }
}

fn source(duration: f64) -> SourceMedia {
    SourceMedia::new("/videos/talk.mp4", duration, 1920, 1080).unwrap()
}

fn decoder(counters: &Arc<Counters>) -> MockDecoder {
    MockDecoder {
        counters: Arc::clone(counters),
        fail_open: false,
        fail_extract_on: None,
    }
}

// Emitter tests

#[test]
fn test_emits_one_short_per_segment_in_order() {
    let dir = TempDir::new().unwrap();
    let counters = Arc::new(Counters::default());
    let sink = MockSink::default();
    let finished = Arc::clone(&sink.finished);
    let emitter = ClipEmitter::new(decoder(&counters), sink, "mp4");

    let media = source(200.0);
    let segments = plan_segments(media.duration, 60.0);
    let outputs = emitter.emit(&media, &segments, dir.path()).unwrap();

    let names: Vec<&str> = outputs.iter().map(|o| o.filename.as_str()).collect();
    assert_eq!(names, vec!["talk_part1.mp4", "talk_part2.mp4", "talk_part3.mp4"]);
    assert_eq!(outputs.iter().map(|o| o.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!((outputs[0].start - 10.0).abs() < 1e-9);
    assert!((outputs[2].end - 192.0).abs() < 1e-9);
    for output in &outputs {
        assert_eq!(output.bytes, 300);
        assert_eq!(output.path, dir.path().join(&output.filename));
        assert!(output.path.exists());
    }

    assert_eq!(finished.lock().unwrap().len(), 3);
    assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_every_writer_gets_the_even_aligned_crop() {
    let dir = TempDir::new().unwrap();
    let counters = Arc::new(Counters::default());
    let sink = MockSink::default();
    let crops = Arc::clone(&sink.crops);
    let emitter = ClipEmitter::new(decoder(&counters), sink, "mp4");

    let media = source(100.0);
    let segments = plan_segments(media.duration, 60.0);
    emitter.emit(&media, &segments, dir.path()).unwrap();

    let expected = PixelRect {
        x: 656,
        y: 0,
        width: 608,
        height: 1080,
    };
    assert_eq!(*crops.lock().unwrap(), vec![expected, expected]);
}

#[test]
fn test_extraction_failure_aborts_remaining_segments() {
    let dir = TempDir::new().unwrap();
    let counters = Arc::new(Counters::default());
    let decoder = MockDecoder {
        fail_extract_on: Some(2),
        ..decoder(&counters)
    };
    let sink = MockSink::default();
    let finished = Arc::clone(&sink.finished);
    let emitter = ClipEmitter::new(decoder, sink, "mp4");

    let media = source(200.0);
    let segments = plan_segments(media.duration, 60.0);
    assert_eq!(segments.len(), 3);

    let err = emitter.emit(&media, &segments, dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExtractionFailure);
    assert_eq!(err.segment_index(), Some(2));
    assert!(err.to_string().contains("corrupt packet"));

    // Segment 1 stays on disk, nothing is produced for segment 3
    let written = finished.lock().unwrap().clone();
    assert_eq!(written, vec![dir.path().join("talk_part1.mp4")]);
    assert!(!dir.path().join("talk_part3.mp4").exists());
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_writer_failure_is_encode_failure() {
    let dir = TempDir::new().unwrap();
    let counters = Arc::new(Counters::default());
    let sink = MockSink {
        fail_write_on: Some("talk_part2.mp4".to_string()),
        ..Default::default()
    };
    let emitter = ClipEmitter::new(decoder(&counters), sink, "mp4");

    let media = source(100.0);
    let segments = plan_segments(media.duration, 60.0);
    let err = emitter.emit(&media, &segments, dir.path()).unwrap_err();

    assert_eq!(
        err,
        DomainError::EncodeFailure {
            index: 2,
            message: "disk full".to_string()
        }
    );
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_open_failure_propagates_without_release() {
    let dir = TempDir::new().unwrap();
    let counters = Arc::new(Counters::default());
    let decoder = MockDecoder {
        fail_open: true,
        ..decoder(&counters)
    };
    let emitter = ClipEmitter::new(decoder, MockSink::default(), "mp4");

    let media = source(30.0);
    let err = emitter
        .emit(&media, &plan_segments(media.duration, 60.0), dir.path())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProbeFailure);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 0);
}

#[test]
fn test_empty_plan_does_not_open_source() {
    let dir = TempDir::new().unwrap();
    let counters = Arc::new(Counters::default());
    let emitter = ClipEmitter::new(decoder(&counters), MockSink::default(), "mp4");

    let media = source(0.0);
    let segments = plan_segments(media.duration, 60.0);
    assert!(segments.is_empty());

    let outputs = emitter.emit(&media, &segments, dir.path()).unwrap();
    assert!(outputs.is_empty());
    assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 0);
}

#[test]
fn test_container_extension_is_used_for_names() {
    let dir = TempDir::new().unwrap();
    let counters = Arc::new(Counters::default());
    let emitter = ClipEmitter::new(decoder(&counters), MockSink::default(), "mkv");

    let media = source(30.0);
    let outputs = emitter
        .emit(&media, &plan_segments(media.duration, 60.0), dir.path())
        .unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].filename, "talk_part1.mkv");
    assert!((outputs[0].end - 30.0).abs() < 1e-9);
}
