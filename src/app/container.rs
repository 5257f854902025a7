use std::sync::Arc;

use crate::adapters::{LibavDecoderAdapter, LibavSinkAdapter, ProbeLibavAdapter};
use crate::app::{
    batch_interactor::BatchInteractor, inspect_interactor::InspectInteractor,
    shorts_interactor::ShortsInteractor,
};
use crate::config_initialization::AppConfig;
use crate::domain::errors::DomainError;
use crate::engine::ClipEmitter;
use crate::ports::{ProbePort, ShortsService};

/// Shorts interactor wired to the libav adapters
pub type LibavShortsInteractor = ShortsInteractor<LibavDecoderAdapter, LibavSinkAdapter>;

pub trait AppContainer: Send + Sync {
    fn shorts_service(&self) -> Arc<dyn ShortsService>;
    fn batch_interactor(&self) -> Arc<BatchInteractor>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
}

pub struct DefaultAppContainer {
    shorts_service: Arc<dyn ShortsService>,
    batch_interactor: Arc<BatchInteractor>,
    inspect_interactor: Arc<InspectInteractor>,
}

impl DefaultAppContainer {
    pub fn new(config: &AppConfig) -> Result<Self, DomainError> {
        let probe_port: Arc<dyn ProbePort> = Arc::new(ProbeLibavAdapter::new()?);
        let decoder = LibavDecoderAdapter::new(config.encoder.audio)?;
        let sink = LibavSinkAdapter::new(config.encoder.clone(), config.overwrite, config.container.clone())?;
        let emitter = ClipEmitter::new(decoder, sink, config.container.clone());

        let shorts: Arc<dyn ShortsService> = Arc::new(LibavShortsInteractor::new(
            Arc::clone(&probe_port),
            emitter,
            config.segment_length,
            config.output_dir.clone(),
        ));

        Ok(Self::from_parts(shorts, probe_port, config.max_concurrent_jobs))
    }

    /// Assemble a container around an arbitrary service and prober
    pub fn from_parts(
        shorts_service: Arc<dyn ShortsService>,
        probe_port: Arc<dyn ProbePort>,
        max_concurrent_jobs: usize,
    ) -> Self {
        let batch_interactor = Arc::new(BatchInteractor::new(
            Arc::clone(&shorts_service),
            max_concurrent_jobs,
        ));
        let inspect_interactor = Arc::new(InspectInteractor::new(probe_port));

        Self {
            shorts_service,
            batch_interactor,
            inspect_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn shorts_service(&self) -> Arc<dyn ShortsService> {
        Arc::clone(&self.shorts_service)
    }

    fn batch_interactor(&self) -> Arc<BatchInteractor> {
        Arc::clone(&self.batch_interactor)
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }
}
