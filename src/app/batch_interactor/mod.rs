// Batch interactor - Runs many shorts requests with bounded concurrency

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::adapters::probe_libav::ProbeLibavAdapter;
use crate::domain::errors::*;
use crate::domain::usecases::*;
use crate::error::VertixError;
use crate::ports::*;

/// Outcome of one source in a batch
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub result: Result<ShortsResponse, DomainError>,
}

impl BatchItem {
    pub fn envelope(&self) -> ShortsEnvelope {
        match &self.result {
            Ok(response) => response.envelope(),
            Err(error) => ShortsEnvelope::from(error),
        }
    }
}

/// Per-source results, in the order the sources were given
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BatchReportItem>,
}

#[derive(Debug, Serialize)]
pub struct BatchReportItem {
    pub input: PathBuf,
    #[serde(flatten)]
    pub envelope: ShortsEnvelope,
}

impl BatchReport {
    pub fn from_items(items: &[BatchItem]) -> Self {
        let succeeded = items.iter().filter(|item| item.result.is_ok()).count();
        Self {
            succeeded,
            failed: items.len() - succeeded,
            items: items
                .iter()
                .map(|item| BatchReportItem {
                    input: item.input.clone(),
                    envelope: item.envelope(),
                })
                .collect(),
        }
    }
}

/// Interactor for processing several sources
pub struct BatchInteractor {
    service: Arc<dyn ShortsService>,
    max_concurrent_jobs: usize,
}

impl BatchInteractor {
    pub fn new(service: Arc<dyn ShortsService>, max_concurrent_jobs: usize) -> Self {
        Self {
            service,
            max_concurrent_jobs: max_concurrent_jobs.max(1),
        }
    }

    /// Expand files and directories into the list of sources to process.
    ///
    /// Directories are walked recursively and only files with a supported
    /// video extension are kept. Explicit files are kept as given.
    pub fn discover(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, DomainError> {
        let mut seen = HashSet::new();
        let mut sources = Vec::new();

        for input in inputs {
            if input.is_file() {
                if seen.insert(input.clone()) {
                    sources.push(input.clone());
                }
            } else if input.is_dir() {
                let mut found: Vec<PathBuf> = WalkDir::new(input)
                    .into_iter()
                    .filter_map(|entry| match entry {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            warn!("Skipping unreadable entry: {}", e);
                            None
                        }
                    })
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|path| ProbeLibavAdapter::is_supported_format(path))
                    .collect();
                found.sort();
                debug!("Found {} sources under {}", found.len(), input.display());

                for path in found {
                    if seen.insert(path.clone()) {
                        sources.push(path);
                    }
                }
            } else {
                return Err(DomainError::BadArgs(format!(
                    "Input does not exist: {}",
                    input.display()
                )));
            }
        }

        Self::check_output_names(&sources)?;
        Ok(sources)
    }

    /// Sources sharing a file stem would write the same `<stem>_partN` files
    fn check_output_names(sources: &[PathBuf]) -> Result<(), DomainError> {
        let mut stems: HashMap<String, &PathBuf> = HashMap::new();
        for source in sources {
            let stem = source
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .unwrap_or_default();
            if let Some(previous) = stems.insert(stem.clone(), source) {
                return Err(DomainError::BadArgs(format!(
                    "{} and {} would both write {}_part*; rename one of them",
                    previous.display(),
                    source.display(),
                    stem
                )));
            }
        }
        Ok(())
    }

    /// Run one request per source, at most `max_concurrent_jobs` at a time
    pub async fn run(&self, sources: Vec<PathBuf>, template: &ShortsRequest) -> Vec<BatchItem> {
        info!(
            "Processing {} sources with up to {} concurrent jobs",
            sources.len(),
            self.max_concurrent_jobs
        );
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_jobs));

        let handles: Vec<_> = sources
            .into_iter()
            .map(|input| {
                let request = ShortsRequest {
                    input: input.clone(),
                    ..template.clone()
                };
                let service = Arc::clone(&self.service);
                let semaphore = Arc::clone(&semaphore);
                let handle = tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| DomainError::FsFail(format!("Job queue closed: {}", e)))?;
                    service.generate(request).await
                });
                (input, handle)
            })
            .collect();

        let mut items = Vec::with_capacity(handles.len());
        for (input, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(VertixError::from(e).into()),
            };
            if let Err(e) = &result {
                warn!("{}: {}", input.display(), e);
            }
            items.push(BatchItem { input, result });
        }

        let failed = items.iter().filter(|item| item.result.is_err()).count();
        info!("Batch finished: {} succeeded, {} failed", items.len() - failed, failed);
        items
    }
}
