// Shorts interactor - Orchestrates the probe, plan and emit use case for one source

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::domain::errors::*;
use crate::domain::rules::*;
use crate::domain::usecases::*;
use crate::engine::ClipEmitter;
use crate::error::VertixError;
use crate::ports::*;

/// Interactor turning one local source into vertical shorts
pub struct ShortsInteractor<D, S> {
    probe_port: Arc<dyn ProbePort>,
    emitter: Arc<ClipEmitter<D, S>>,
    /// Used when the request carries no segment length
    segment_length: f64,
    /// Used when the request carries no output directory
    output_dir: PathBuf,
}

impl<D, S> ShortsInteractor<D, S>
where
    D: MediaDecoder + 'static,
    S: ClipSink<Unit = D::Unit> + 'static,
{
    /// Create new shorts interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        emitter: ClipEmitter<D, S>,
        segment_length: f64,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probe_port,
            emitter: Arc::new(emitter),
            segment_length,
            output_dir: output_dir.into(),
        }
    }

    fn join_error(error: tokio::task::JoinError) -> DomainError {
        VertixError::from(error).into()
    }
}

#[async_trait]
impl<D, S> ShortsService for ShortsInteractor<D, S>
where
    D: MediaDecoder + 'static,
    S: ClipSink<Unit = D::Unit> + 'static,
{
    #[instrument(skip_all, fields(input = %request.input.display()))]
    async fn generate(&self, request: ShortsRequest) -> Result<ShortsResponse, DomainError> {
        let started = Instant::now();

        if !request.input.is_file() {
            return Err(DomainError::BadArgs(format!(
                "Input file does not exist: {}",
                request.input.display()
            )));
        }
        let segment_length =
            SegmentPlanner::validate_length(request.segment_length.unwrap_or(self.segment_length))?;
        let output_dir = request.output_dir.clone().unwrap_or_else(|| self.output_dir.clone());

        let probe_port = Arc::clone(&self.probe_port);
        let input = request.input.clone();
        let media = tokio::task::spawn_blocking(move || probe_port.probe(&input))
            .await
            .map_err(Self::join_error)??;
        info!(
            "Probed source: {:.3}s, {}x{}",
            media.duration, media.width, media.height
        );

        let planned = SegmentPlanner::plan(media.duration, segment_length);
        let crop = CropGeometry::pixel_rect(media.width, media.height);
        info!("Planned {} segments of {}s, crop {}", planned.len(), segment_length, crop);

        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| {
            DomainError::FsFail(format!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let emitter = Arc::clone(&self.emitter);
        let job_media = media.clone();
        let job_segments = planned.clone();
        let outputs = tokio::task::spawn_blocking(move || {
            emitter.emit(&job_media, &job_segments, &output_dir)
        })
        .await
        .map_err(Self::join_error)??;

        Ok(ShortsResponse {
            source: media,
            crop,
            segment_length,
            planned,
            outputs,
            generated_at: Utc::now(),
            processing_seconds: started.elapsed().as_secs_f64(),
        })
    }
}
