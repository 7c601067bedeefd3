//! Bounded concurrent download of a batch of materials.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use super::constants::DEFAULT_CHUNK_SIZE;
use super::error::DownloadError;
use super::filename::unique_batch_names;
use super::transfer::fetch_material;
use super::{DownloadOutcome, DownloadRequest};
use crate::config::EngineConfig;
use crate::pool::clamp_workers;
use crate::transport::Transport;

/// Downloads batches of materials into a destination directory.
///
/// # Concurrency Model
///
/// - Each material runs in its own Tokio task
/// - A semaphore permit is acquired before spawning each task
/// - Outcomes are returned in request order regardless of completion order
/// - A panicking task fails only its own material
#[derive(Debug, Clone)]
pub struct DownloadManager {
    transport: Transport,
    semaphore: Arc<Semaphore>,
    workers: usize,
    chunk_size: u64,
}

impl DownloadManager {
    /// Creates a manager sharing `transport` (and its cookie jar).
    #[must_use]
    pub fn new(transport: Transport, config: &EngineConfig) -> Self {
        let workers = clamp_workers(config.workers);
        Self {
            transport,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Overrides the ranged chunk size. Zero is treated as one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Configured chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Downloads every request into `dest`, one outcome per request in
    /// input order.
    ///
    /// Individual failures never abort the batch; they are reported in the
    /// corresponding [`DownloadOutcome`].
    #[instrument(skip(self, requests), fields(dest = %dest.display(), count = requests.len()))]
    pub async fn download(&self, requests: Vec<DownloadRequest>, dest: &Path) -> Vec<DownloadOutcome> {
        let names = unique_batch_names(requests.iter().map(|request| request.material.name.as_str()));

        if let Err(e) = tokio::fs::create_dir_all(dest).await {
            warn!(error = %e, "cannot create destination directory");
            let kind = e.kind();
            return names
                .into_iter()
                .map(|name| DownloadOutcome::new(name, Err(DownloadError::io(dest, kind.into()))))
                .collect();
        }

        info!(workers = self.workers, "starting downloads");
        let mut handles = Vec::with_capacity(requests.len());

        for (request, name) in requests.into_iter().zip(names) {
            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    handles.push((name, Err(DownloadError::task(e.to_string()))));
                    continue;
                }
            };

            let transport = self.transport.clone();
            let final_path = dest.join(&name);
            let chunk_size = self.chunk_size;
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let DownloadRequest { material, progress } = request;
                fetch_material(&transport, &material, &final_path, chunk_size, progress.as_ref()).await
            });
            handles.push((name, Ok(handle)));
        }

        debug!(task_count = handles.len(), "waiting for downloads to complete");

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let result = match handle {
                Ok(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(name = %name, error = %e, "download task panicked");
                        Err(DownloadError::task(e.to_string()))
                    }
                },
                Err(e) => Err(e),
            };
            match &result {
                Ok(path) => info!(name = %name, path = %path.display(), "download completed"),
                Err(e) => warn!(name = %name, error = %e, status = %e.status_text(), "download failed"),
            }
            outcomes.push(DownloadOutcome::new(name, result));
        }

        let succeeded = outcomes.iter().filter(|outcome| outcome.success()).count();
        info!(succeeded, failed = outcomes.len() - succeeded, "downloads finished");
        outcomes
    }
}
