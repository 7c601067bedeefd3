//! Download manager for resolved lecture materials.
//!
//! Materials are fetched concurrently into one destination directory. Each
//! transfer is either a plain `200` body streamed to disk, or a `206` range
//! loop that appends fixed-size chunks to a part file and renames it once
//! the last byte has arrived.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use lecture_core::{DownloadManager, DownloadRequest, EngineConfig, Material, MaterialKind, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::default();
//! let transport = Transport::new(config.timeouts)?;
//! let manager = DownloadManager::new(transport, &config);
//! let material = Material::new("week1.pdf", MaterialKind::Document, "https://lcms.example/week1.pdf");
//! for outcome in manager.download(vec![DownloadRequest::new(material)], Path::new("./out")).await {
//!     println!("{}: {}", outcome.name, outcome.status_text());
//! }
//! # Ok(())
//! # }
//! ```

mod constants;
mod error;
mod filename;
mod manager;
mod profile;
mod transfer;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use constants::{DEFAULT_CHUNK_SIZE, PART_FILE_SUFFIX};
pub use error::DownloadError;
pub use manager::DownloadManager;
pub use profile::HeaderProfile;
pub use transfer::ContentRange;

use crate::resolver::Material;

/// Receives the whole-percent progress of a ranged transfer.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// One material to download, with an optional progress observer.
#[derive(Clone)]
pub struct DownloadRequest {
    /// Material to fetch.
    pub material: Material,
    /// Called before every follow-up range request.
    pub progress: Option<ProgressCallback>,
}

impl DownloadRequest {
    /// Request without progress reporting.
    #[must_use]
    pub fn new(material: Material) -> Self {
        Self {
            material,
            progress: None,
        }
    }

    /// Attaches a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("material", &self.material)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Result of downloading one material.
#[derive(Debug)]
pub struct DownloadOutcome {
    /// Target file name inside the destination directory.
    pub name: String,
    /// Written path, or why the material failed.
    pub result: Result<PathBuf, DownloadError>,
}

impl DownloadOutcome {
    pub(crate) fn new(name: String, result: Result<PathBuf, DownloadError>) -> Self {
        Self { name, result }
    }

    /// True when the file was written completely.
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    /// `"OK"`, or the short error code of the failure.
    #[must_use]
    pub fn status_text(&self) -> String {
        match &self.result {
            Ok(_) => "OK".to_string(),
            Err(e) => e.status_text(),
        }
    }
}
