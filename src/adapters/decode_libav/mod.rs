//! Decoding adapter using libav bindings
//!
//! Opens a source once and decodes the requested sub-ranges into video frames,
//! forwarding the matching audio packets untouched.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::{codec, format, frame, media, Packet, Rational};
use tracing::{debug, trace};

use crate::domain::errors::DomainError;
use crate::domain::model::{Segment, SourceMedia};
use crate::error::VertixError;
use crate::ports::{MediaDecoder, SourceHandle};

/// Decoded media flowing from the decoder to the encode sink
pub enum LibavUnit {
    /// A decoded picture, `offset` seconds after the segment start
    Video { frame: frame::Video, offset: f64 },
    /// A compressed audio packet, timestamps already shifted to the segment start
    Audio { packet: Packet, time_base: Rational },
}

/// LibAV decoder adapter
pub struct LibavDecoderAdapter {
    /// Forward audio packets alongside the video frames
    audio: bool,
}

impl LibavDecoderAdapter {
    pub fn new(audio: bool) -> Result<Self, DomainError> {
        ffmpeg::init().map_err(|e| DomainError::from(VertixError::from(e)))?;
        Ok(Self { audio })
    }
}

impl MediaDecoder for LibavDecoderAdapter {
    type Unit = LibavUnit;
    type Source = LibavSource;

    fn open(&self, media: &SourceMedia) -> Result<LibavSource, DomainError> {
        let input = format::input(&media.path).map_err(|e| {
            DomainError::ProbeFailure(format!("Failed to open {}: {}", media.path.display(), e))
        })?;

        let video_index = input
            .streams()
            .best(media::Type::Video)
            .map(|stream| stream.index())
            .ok_or_else(|| {
                DomainError::ProbeFailure(format!("No video stream in {}", media.path.display()))
            })?;

        let audio_index = if self.audio {
            input.streams().best(media::Type::Audio).map(|stream| stream.index())
        } else {
            None
        };

        debug!(
            "Opened {} (video stream {}, audio stream {:?})",
            media.path.display(),
            video_index,
            audio_index
        );

        Ok(LibavSource {
            input: Some(input),
            video_index,
            audio_index,
        })
    }
}

/// An opened source container
pub struct LibavSource {
    input: Option<format::context::Input>,
    video_index: usize,
    audio_index: Option<usize>,
}

/// How far past a segment's end the demuxer keeps reading for trailing audio
const AUDIO_LOOKAHEAD_SECONDS: f64 = 1.0;

impl LibavSource {
    /// Seconds since the media origin for a stream timestamp
    fn seconds(ts: i64, time_base: Rational, origin: f64) -> f64 {
        ts as f64 * f64::from(time_base) - origin
    }

    /// Start of the media timeline in seconds; MPEG-TS sources rarely start at zero
    fn origin(start_time: i64, time_base: Rational) -> f64 {
        if start_time == ffmpeg::ffi::AV_NOPTS_VALUE {
            0.0
        } else {
            start_time as f64 * f64::from(time_base)
        }
    }

    /// Forward every decoded frame inside the segment, returns false once past its end
    fn drain_frames(
        decoder: &mut codec::decoder::Video,
        time_base: Rational,
        origin: f64,
        segment: &Segment,
        consume: &mut dyn FnMut(LibavUnit) -> Result<(), DomainError>,
    ) -> Result<bool, DomainError> {
        let mut decoded = frame::Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            let Some(ts) = decoded.timestamp().or_else(|| decoded.pts()) else {
                continue;
            };
            let time = Self::seconds(ts, time_base, origin);
            if time < segment.start {
                continue;
            }
            if time >= segment.end {
                return Ok(false);
            }

            let frame = std::mem::replace(&mut decoded, frame::Video::empty());
            consume(LibavUnit::Video {
                frame,
                offset: time - segment.start,
            })?;
        }
        Ok(true)
    }
}

fn extraction_error(segment: &Segment, message: impl Into<String>) -> DomainError {
    DomainError::ExtractionFailure {
        index: segment.index,
        message: message.into(),
    }
}

impl SourceHandle for LibavSource {
    type Unit = LibavUnit;

    fn extract(
        &mut self,
        segment: &Segment,
        consume: &mut dyn FnMut(LibavUnit) -> Result<(), DomainError>,
    ) -> Result<(), DomainError> {
        let input = self
            .input
            .as_mut()
            .ok_or_else(|| extraction_error(segment, "source has already been released"))?;

        let video_stream = input
            .stream(self.video_index)
            .ok_or_else(|| extraction_error(segment, format!("Video stream {} not found", self.video_index)))?;
        let video_time_base = video_stream.time_base();
        let mut decoder = codec::context::Context::from_parameters(video_stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|e| extraction_error(segment, format!("Failed to create video decoder: {}", e)))?;

        let origin = Self::origin(video_stream.start_time(), video_time_base);

        let audio_time_base = self
            .audio_index
            .and_then(|index| input.stream(index))
            .map(|stream| stream.time_base());

        // Seek to the keyframe at or before the start; frames before it are decoded and dropped.
        // Segments may revisit earlier ranges, so this also rewinds for a start of zero.
        let target = ((segment.start + origin) * f64::from(ffmpeg::ffi::AV_TIME_BASE)) as i64;
        input
            .seek(target, ..target)
            .map_err(|e| extraction_error(segment, format!("Failed to seek to {:.3}s: {}", segment.start, e)))?;

        let mut video_done = false;
        for (stream, packet) in input.packets() {
            if stream.index() == self.video_index {
                if video_done {
                    let past = packet
                        .pts()
                        .map(|pts| Self::seconds(pts, video_time_base, origin))
                        .is_some_and(|time| time >= segment.end + AUDIO_LOOKAHEAD_SECONDS);
                    if past {
                        break;
                    }
                    continue;
                }
                decoder
                    .send_packet(&packet)
                    .map_err(|e| extraction_error(segment, format!("Failed to decode packet: {}", e)))?;
                video_done = !Self::drain_frames(&mut decoder, video_time_base, origin, segment, consume)?;
                if video_done && audio_time_base.is_none() {
                    break;
                }
            } else if Some(stream.index()) == self.audio_index {
                let Some(time_base) = audio_time_base else {
                    continue;
                };
                let Some(pts) = packet.pts() else {
                    continue;
                };
                let time = Self::seconds(pts, time_base, origin);
                if time >= segment.end {
                    if video_done {
                        break;
                    }
                    continue;
                }
                if time < segment.start {
                    continue;
                }

                let shift = ((segment.start + origin) / f64::from(time_base)).round() as i64;
                let mut packet = packet;
                packet.set_pts(Some(pts - shift));
                packet.set_dts(packet.dts().map(|dts| (dts - shift).max(0)));
                consume(LibavUnit::Audio { packet, time_base })?;
            }
        }

        if !video_done {
            decoder
                .send_eof()
                .map_err(|e| extraction_error(segment, format!("Failed to flush decoder: {}", e)))?;
            Self::drain_frames(&mut decoder, video_time_base, origin, segment, consume)?;
        }

        trace!("Extracted segment {}", segment);
        Ok(())
    }

    fn release(&mut self) {
        if self.input.take().is_some() {
            debug!("Closed source input");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_relative_to_origin() {
        let time_base = Rational(1, 90_000);
        let origin = LibavSource::origin(126_000, time_base);
        assert!((origin - 1.4).abs() < 1e-9);

        // First frame of a transport stream lands at zero, not at 1.4s
        assert!(LibavSource::seconds(126_000, time_base, origin).abs() < 1e-9);
        assert!((LibavSource::seconds(216_000, time_base, origin) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_origin_without_start_time() {
        let time_base = Rational(1, 1000);
        assert_eq!(LibavSource::origin(ffmpeg::ffi::AV_NOPTS_VALUE, time_base), 0.0);
        assert_eq!(LibavSource::seconds(2500, time_base, 0.0), 2.5);
    }
}
