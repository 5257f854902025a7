//! Encode sink using libav bindings
//!
//! Every clip is written to a hidden temporary file next to its final name and
//! only renamed into place once the trailer has been written.

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;
use ffmpeg_next::{codec, encoder, filter, format, frame, media, picture, Dictionary, Packet, Rational};
use tempfile::TempPath;
use tracing::{debug, trace, warn};

use crate::adapters::decode_libav::LibavUnit;
use crate::domain::errors::DomainError;
use crate::domain::model::{PixelRect, SourceMedia};
use crate::engine::{EncoderSettings, OverwritePolicy};
use crate::error::VertixError;
use crate::ports::{ClipSink, ClipWriter};

/// Encoder clock, fine enough for any common frame rate
const ENCODER_TIME_BASE: Rational = Rational(1, 90_000);

/// LibAV crop-and-encode sink
pub struct LibavSinkAdapter {
    settings: EncoderSettings,
    overwrite: OverwritePolicy,
    container: String,
}

impl LibavSinkAdapter {
    pub fn new(
        settings: EncoderSettings,
        overwrite: OverwritePolicy,
        container: impl Into<String>,
    ) -> Result<Self, DomainError> {
        settings.validate()?;
        ffmpeg::init().map_err(|e| DomainError::from(VertixError::from(e)))?;
        Ok(Self {
            settings,
            overwrite,
            container: container.into(),
        })
    }

    /// Muxer name for a container extension
    pub fn muxer_name(container: &str) -> &str {
        match container {
            "mkv" => "matroska",
            "m4v" => "mp4",
            other => other,
        }
    }

    fn temp_path(&self, output: &Path) -> Result<TempPath, DomainError> {
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        tempfile::Builder::new()
            .prefix(".vertix-")
            .suffix(&format!(".{}", self.container))
            .tempfile_in(dir)
            .map(|file| file.into_temp_path())
            .map_err(|e| DomainError::FsFail(format!("Failed to create temporary file in {}: {}", dir.display(), e)))
    }

    /// Add a pass-through stream mirroring the source's best audio stream
    fn add_audio_stream(
        octx: &mut format::context::Output,
        media: &SourceMedia,
    ) -> Result<Option<usize>, DomainError> {
        let input = format::input(&media.path)
            .map_err(|e| DomainError::ProbeFailure(format!("Failed to open {}: {}", media.path.display(), e)))?;
        let Some(audio) = input.streams().best(media::Type::Audio) else {
            return Ok(None);
        };

        let mut stream = octx
            .add_stream(encoder::find(codec::Id::None))
            .map_err(|e| DomainError::BadArgs(format!("Failed to add audio stream: {}", e)))?;
        stream.set_parameters(audio.parameters());
        // The source's codec tag may be invalid for the output container.
        // SAFETY: `parameters()` wraps the stream's own `codecpar`, which lives as
        // long as `octx`; nothing else touches it before `write_header`.
        unsafe {
            (*stream.parameters().as_mut_ptr()).codec_tag = 0;
        }
        Ok(Some(stream.index()))
    }
}

impl ClipSink for LibavSinkAdapter {
    type Unit = LibavUnit;
    type Writer = LibavClipWriter;

    fn create(
        &self,
        media: &SourceMedia,
        crop: &PixelRect,
        output: &Path,
    ) -> Result<LibavClipWriter, DomainError> {
        if self.overwrite == OverwritePolicy::Never && output.exists() {
            return Err(DomainError::FsFail(format!(
                "Output already exists: {}",
                output.display()
            )));
        }

        let temp = self.temp_path(output)?;
        let mut octx = format::output_as(&temp, Self::muxer_name(&self.container))
            .map_err(|e| DomainError::BadArgs(format!("Failed to create output {}: {}", output.display(), e)))?;
        let global_header = octx.format().flags().contains(format::Flags::GLOBAL_HEADER);

        let codec = encoder::find_by_name(&self.settings.video_codec).ok_or_else(|| {
            DomainError::BadArgs(format!("Video encoder not available: {}", self.settings.video_codec))
        })?;

        let mut stream = octx
            .add_stream(codec)
            .map_err(|e| DomainError::BadArgs(format!("Failed to add video stream: {}", e)))?;
        let video_index = stream.index();

        let mut context = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| DomainError::BadArgs(format!("Failed to create video encoder: {}", e)))?;
        context.set_width(crop.width);
        context.set_height(crop.height);
        context.set_format(format::Pixel::YUV420P);
        context.set_time_base(ENCODER_TIME_BASE);
        context.set_frame_rate(media.frame_rate.map(Rational::from));
        if global_header {
            context.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let mut options = Dictionary::new();
        options.set("preset", &self.settings.preset);
        options.set("crf", &self.settings.crf.to_string());
        options.set("threads", &self.settings.threads.to_string());

        let encoder = context
            .open_with(options)
            .map_err(|e| DomainError::BadArgs(format!("Failed to open {} encoder: {}", self.settings.video_codec, e)))?;
        stream.set_parameters(&encoder);

        let audio_index = if self.settings.audio && media.has_audio {
            Self::add_audio_stream(&mut octx, media)?
        } else {
            None
        };

        octx.write_header()
            .map_err(|e| DomainError::BadArgs(format!("Failed to write header: {}", e)))?;

        let video_time_base = octx
            .stream(video_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| DomainError::BadArgs("Video output stream disappeared".to_string()))?;
        let audio = match audio_index {
            Some(index) => octx.stream(index).map(|stream| (index, stream.time_base())),
            None => None,
        };

        debug!(
            "Opened writer for {} ({}x{}, {} crf {}, audio: {})",
            output.display(),
            crop.width,
            crop.height,
            self.settings.video_codec,
            self.settings.crf,
            audio.is_some()
        );

        Ok(LibavClipWriter {
            octx,
            encoder,
            graph: None,
            crop: *crop,
            video_index,
            video_time_base,
            audio,
            last_pts: None,
            frames: 0,
            temp,
            output: output.to_path_buf(),
            overwrite: self.overwrite,
        })
    }
}

/// Writer for one cropped clip
pub struct LibavClipWriter {
    octx: format::context::Output,
    encoder: encoder::Video,
    /// Built on the first frame, once the decoded pixel format is known
    graph: Option<filter::Graph>,
    crop: PixelRect,
    video_index: usize,
    video_time_base: Rational,
    audio: Option<(usize, Rational)>,
    last_pts: Option<i64>,
    frames: u64,
    temp: TempPath,
    output: PathBuf,
    overwrite: OverwritePolicy,
}

impl LibavClipWriter {
    fn crop_graph(&self, frame: &frame::Video) -> Result<filter::Graph, DomainError> {
        let mut graph = filter::Graph::new();
        let pixel_format: ffmpeg::ffi::AVPixelFormat = frame.format().into();
        let args = format!(
            "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect=1/1",
            frame.width(),
            frame.height(),
            pixel_format as i32,
            ENCODER_TIME_BASE.numerator(),
            ENCODER_TIME_BASE.denominator()
        );

        let buffer = filter::find("buffer").ok_or_else(|| DomainError::BadArgs("buffer filter not found".to_string()))?;
        let buffersink =
            filter::find("buffersink").ok_or_else(|| DomainError::BadArgs("buffersink filter not found".to_string()))?;
        graph
            .add(&buffer, "in", &args)
            .map_err(|e| DomainError::BadArgs(format!("Failed to add buffer source: {}", e)))?;
        graph
            .add(&buffersink, "out", "")
            .map_err(|e| DomainError::BadArgs(format!("Failed to add buffer sink: {}", e)))?;

        let spec = format!("{},format=yuv420p", self.crop.filter_spec());
        graph
            .output("in", 0)
            .and_then(|parser| parser.input("out", 0))
            .and_then(|parser| parser.parse(&spec))
            .map_err(|e| DomainError::BadArgs(format!("Failed to parse filter '{}': {}", spec, e)))?;
        graph
            .validate()
            .map_err(|e| DomainError::BadArgs(format!("Invalid crop filter graph: {}", e)))?;

        debug!("Built crop graph: {}", spec);
        Ok(graph)
    }

    fn write_video(&mut self, mut frame: frame::Video, offset: f64) -> Result<(), DomainError> {
        if self.graph.is_none() {
            self.graph = Some(self.crop_graph(&frame)?);
        }

        let mut pts = (offset * f64::from(ENCODER_TIME_BASE.denominator())).round() as i64;
        if let Some(last) = self.last_pts {
            pts = pts.max(last + 1);
        }
        self.last_pts = Some(pts);
        frame.set_pts(Some(pts));
        frame.set_kind(picture::Type::None);

        if let Some(graph) = self.graph.as_mut() {
            let mut source = graph
                .get("in")
                .ok_or_else(|| DomainError::BadArgs("Crop graph has no input".to_string()))?;
            source
                .source()
                .add(&frame)
                .map_err(|e| DomainError::BadArgs(format!("Failed to push frame into crop graph: {}", e)))?;
        }
        self.drain_graph()
    }

    /// Move every cropped frame from the graph into the encoder
    fn drain_graph(&mut self) -> Result<(), DomainError> {
        let Some(graph) = self.graph.as_mut() else {
            return Ok(());
        };
        let mut sink = graph
            .get("out")
            .ok_or_else(|| DomainError::BadArgs("Crop graph has no output".to_string()))?;

        let mut cropped = frame::Video::empty();
        while sink.sink().frame(&mut cropped).is_ok() {
            self.encoder
                .send_frame(&cropped)
                .map_err(|e| DomainError::BadArgs(format!("Failed to send frame to encoder: {}", e)))?;
            self.frames += 1;
        }
        self.drain_encoder()
    }

    fn drain_encoder(&mut self) -> Result<(), DomainError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.video_index);
            packet.rescale_ts(ENCODER_TIME_BASE, self.video_time_base);
            packet
                .write_interleaved(&mut self.octx)
                .map_err(|e| DomainError::BadArgs(format!("Failed to write video packet: {}", e)))?;
        }
        Ok(())
    }

    fn write_audio(&mut self, mut packet: Packet, time_base: Rational) -> Result<(), DomainError> {
        let Some((index, out_time_base)) = self.audio else {
            return Ok(());
        };
        packet.set_stream(index);
        packet.set_position(-1);
        packet.rescale_ts(time_base, out_time_base);
        packet
            .write_interleaved(&mut self.octx)
            .map_err(|e| DomainError::BadArgs(format!("Failed to write audio packet: {}", e)))
    }
}

impl ClipWriter for LibavClipWriter {
    type Unit = LibavUnit;

    fn write(&mut self, unit: LibavUnit) -> Result<(), DomainError> {
        match unit {
            LibavUnit::Video { frame, offset } => self.write_video(frame, offset),
            LibavUnit::Audio { packet, time_base } => self.write_audio(packet, time_base),
        }
    }

    fn finish(mut self) -> Result<u64, DomainError> {
        if let Some(graph) = self.graph.as_mut() {
            if let Some(mut source) = graph.get("in") {
                source
                    .source()
                    .flush()
                    .map_err(|e| DomainError::BadArgs(format!("Failed to flush crop graph: {}", e)))?;
            }
        }
        self.drain_graph()?;

        self.encoder
            .send_eof()
            .map_err(|e| DomainError::BadArgs(format!("Failed to flush encoder: {}", e)))?;
        self.drain_encoder()?;

        if self.frames == 0 {
            return Err(DomainError::BadArgs(format!(
                "No video frames decoded for {}",
                self.output.display()
            )));
        }

        self.octx
            .write_trailer()
            .map_err(|e| DomainError::BadArgs(format!("Failed to write trailer: {}", e)))?;

        let LibavClipWriter {
            octx,
            encoder,
            graph,
            temp,
            output,
            overwrite,
            frames,
            ..
        } = self;
        drop(graph);
        drop(encoder);
        drop(octx);

        let persisted = match overwrite {
            OverwritePolicy::Always => temp.persist(&output),
            OverwritePolicy::Never => temp.persist_noclobber(&output),
        };
        persisted.map_err(|e| {
            warn!("Could not move clip into place: {}", e.error);
            DomainError::FsFail(format!("Failed to write {}: {}", output.display(), e.error))
        })?;

        let bytes = std::fs::metadata(&output)
            .map(|metadata| metadata.len())
            .map_err(|e| DomainError::FsFail(format!("Failed to stat {}: {}", output.display(), e)))?;
        trace!("Finished {} ({} frames, {} bytes)", output.display(), frames, bytes);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muxer_names() {
        assert_eq!(LibavSinkAdapter::muxer_name("mkv"), "matroska");
        assert_eq!(LibavSinkAdapter::muxer_name("mp4"), "mp4");
        assert_eq!(LibavSinkAdapter::muxer_name("mov"), "mov");
    }
}
