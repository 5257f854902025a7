// Inspect interactor - Orchestrates media inspection and dry-run planning

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::usecases::*;
use crate::error::VertixError;
use crate::ports::*;

/// Interactor for media file inspection use case
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
}

impl InspectInteractor {
    /// Create new inspect interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>) -> Self {
        Self { probe_port }
    }

    /// Probe a source file
    pub async fn inspect(&self, input: &Path) -> Result<SourceMedia, DomainError> {
        if !input.is_file() {
            return Err(DomainError::BadArgs(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        let probe_port = Arc::clone(&self.probe_port);
        let path: PathBuf = input.to_path_buf();
        let media = tokio::task::spawn_blocking(move || probe_port.probe(&path))
            .await
            .map_err(|e| DomainError::from(VertixError::from(e)))??;

        info!(
            "Inspected {}: {:.3}s, {}x{}, aspect {:.4}",
            media.path.display(),
            media.duration,
            media.width,
            media.height,
            media.aspect_ratio()
        );
        Ok(media)
    }

    /// Probe a source file and report what would be generated from it
    pub async fn plan(&self, input: &Path, segment_length: f64) -> Result<PlanReport, DomainError> {
        let media = self.inspect(input).await?;
        PlanReport::for_media(&media, segment_length)
    }
}
