//! Clip emitter: runs planned segments through the decoder and the encode sink

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::{OutputDescriptor, PixelRect, Segment, SourceMedia};
use crate::domain::rules::CropGeometry;
use crate::ports::{ClipSink, ClipWriter, MediaDecoder, SourceHandle};

/// Turns planned segments of one source into cropped output clips
pub struct ClipEmitter<D, S> {
    decoder: D,
    sink: S,
    /// Output container extension, e.g. `mp4`
    container: String,
}

impl<D, S> ClipEmitter<D, S>
where
    D: MediaDecoder,
    S: ClipSink<Unit = D::Unit>,
{
    /// Create a new emitter over a decoder and an encode sink
    pub fn new(decoder: D, sink: S, container: impl Into<String>) -> Self {
        Self {
            decoder,
            sink,
            container: container.into(),
        }
    }

    /// Emit one short per segment into `output_dir`.
    ///
    /// Segments are processed in order. The first failure aborts the call;
    /// shorts already written for earlier segments are left in place. The
    /// source handle is released exactly once on every path.
    pub fn emit(
        &self,
        media: &SourceMedia,
        segments: &[Segment],
        output_dir: &Path,
    ) -> Result<Vec<OutputDescriptor>, DomainError> {
        if segments.is_empty() {
            warn!("No segments to emit for {}", media.path.display());
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let crop = CropGeometry::pixel_rect(media.width, media.height);
        let base_name = media.base_name();

        info!(
            source = %media.path.display(),
            segments = segments.len(),
            crop = %crop,
            "Emitting vertical shorts"
        );

        let mut source = SourceGuard::new(self.decoder.open(media)?);
        let mut outputs = Vec::with_capacity(segments.len());

        for segment in segments {
            let output = output_dir.join(segment.output_name(&base_name, &self.container));
            debug!("Segment {} -> {}", segment, output.display());

            match self.emit_segment(&mut source, media, segment, &crop, &output) {
                Ok(descriptor) => {
                    info!(
                        index = descriptor.index,
                        bytes = descriptor.bytes,
                        "Wrote {}",
                        descriptor.filename
                    );
                    outputs.push(descriptor);
                }
                Err(e) => {
                    error!("Emitting segment {} failed: {}", segment.index, e);
                    return Err(e);
                }
            }
        }

        info!(
            "Emitted {} shorts in {:.2}s",
            outputs.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(outputs)
    }

    fn emit_segment(
        &self,
        source: &mut D::Source,
        media: &SourceMedia,
        segment: &Segment,
        crop: &PixelRect,
        output: &Path,
    ) -> Result<OutputDescriptor, DomainError> {
        let mut writer = self
            .sink
            .create(media, crop, output)
            .map_err(|e| e.into_encode(segment.index))?;

        // Errors raised by the writer keep their encode kind even though they
        // surface through the decoder's extract call.
        let mut sink_error: Option<DomainError> = None;
        let extracted = source.extract(segment, &mut |unit| {
            writer.write(unit).map_err(|e| {
                let e = e.into_encode(segment.index);
                sink_error = Some(e.clone());
                e
            })
        });

        if let Err(e) = extracted {
            return Err(sink_error.unwrap_or_else(|| e.into_extraction(segment.index)));
        }

        let bytes = writer.finish().map_err(|e| e.into_encode(segment.index))?;
        Ok(OutputDescriptor::new(segment, output, bytes))
    }
}

/// Scoped ownership of an acquired source, released on drop
struct SourceGuard<H: SourceHandle> {
    handle: H,
}

impl<H: SourceHandle> SourceGuard<H> {
    fn new(handle: H) -> Self {
        Self { handle }
    }
}

impl<H: SourceHandle> Deref for SourceGuard<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: SourceHandle> DerefMut for SourceGuard<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

impl<H: SourceHandle> Drop for SourceGuard<H> {
    fn drop(&mut self) {
        self.handle.release();
        debug!("Released source handle");
    }
}
