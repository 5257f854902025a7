// Ports - Interface definitions (contracts)

use crate::config_initialization::AppConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::usecases::*;
use async_trait::async_trait;
use std::path::Path;

/// Port for reading source metadata
pub trait ProbePort: Send + Sync {
    /// Probe a decodable file and describe its duration and frame geometry
    fn probe(&self, file_path: &Path) -> Result<SourceMedia, DomainError>;
}

/// Port for decoding sub-ranges of a source
pub trait MediaDecoder: Send + Sync {
    /// Unit of decoded media handed to the encode side
    type Unit;
    type Source: SourceHandle<Unit = Self::Unit>;

    /// Acquire a decoding handle on the source
    fn open(&self, media: &SourceMedia) -> Result<Self::Source, DomainError>;
}

/// An acquired, decodable source
pub trait SourceHandle {
    type Unit;

    /// Decode `[segment.start, segment.end]`, pushing every unit to `consume`.
    ///
    /// An error returned by `consume` must abort the extraction and be
    /// returned unchanged.
    fn extract(
        &mut self,
        segment: &Segment,
        consume: &mut dyn FnMut(Self::Unit) -> Result<(), DomainError>,
    ) -> Result<(), DomainError>;

    /// Release the underlying decoder resources
    fn release(&mut self);
}

/// Port for writing cropped clips
pub trait ClipSink: Send + Sync {
    type Unit;
    type Writer: ClipWriter<Unit = Self::Unit>;

    /// Open a writer producing `output`, cropping every frame to `crop`
    fn create(
        &self,
        media: &SourceMedia,
        crop: &PixelRect,
        output: &Path,
    ) -> Result<Self::Writer, DomainError>;
}

/// An in-progress output clip
pub trait ClipWriter {
    type Unit;

    fn write(&mut self, unit: Self::Unit) -> Result<(), DomainError>;

    /// Flush, close and publish the clip, returning its size in bytes
    fn finish(self) -> Result<u64, DomainError>;
}

/// Port for configuration management
pub trait ConfigPort: Send + Sync {
    /// Load configuration, falling back to defaults when no file exists
    fn load_config(&self) -> Result<AppConfig, DomainError>;

    /// Save configuration to the adapter's file
    fn save_config(&self, config: &AppConfig) -> Result<(), DomainError>;

    /// Path of the file the adapter reads and writes
    fn config_file_path(&self) -> &Path;
}

/// Service turning a request into shorts, seam between hosts and the pipeline
#[async_trait]
pub trait ShortsService: Send + Sync {
    async fn generate(&self, request: ShortsRequest) -> Result<ShortsResponse, DomainError>;
}
