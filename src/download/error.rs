//! Error types for the download module.
//!
//! Each error maps to a short status code shown per material row.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that fail a single material's download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network failure or timeout while requesting or streaming.
    #[error("transfer failed: {0}")]
    Transport(#[from] TransportError),

    /// The first response was neither 200 nor 206.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// Material URL.
        url: String,
        /// Received status code.
        status: u16,
    },

    /// A follow-up ranged request did not answer 206.
    #[error("range request for {url} answered HTTP {status} after {bytes_written} bytes")]
    PartialTransfer {
        /// Material URL.
        url: String,
        /// Received status code.
        status: u16,
        /// Bytes already in the part file.
        bytes_written: u64,
    },

    /// `Content-Range` was missing or not `bytes start-end/total`.
    #[error("malformed Content-Range {header:?} from {url}")]
    MalformedRange {
        /// Material URL.
        url: String,
        /// Raw header value, empty when absent.
        header: String,
    },

    /// File system error while writing or renaming.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The download task panicked or was cancelled.
    #[error("download task failed: {detail}")]
    Task {
        /// Join failure description.
        detail: String,
    },
}

impl DownloadError {
    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a mid-transfer range failure.
    pub fn partial_transfer(url: impl Into<String>, status: u16, bytes_written: u64) -> Self {
        Self::PartialTransfer {
            url: url.into(),
            status,
            bytes_written,
        }
    }

    /// Creates a malformed range error.
    pub fn malformed_range(url: impl Into<String>, header: impl Into<String>) -> Self {
        Self::MalformedRange {
            url: url.into(),
            header: header.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a task failure.
    pub fn task(detail: impl Into<String>) -> Self {
        Self::Task {
            detail: detail.into(),
        }
    }

    /// Short status code for per-row display.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self {
            Self::Transport(TransportError::Timeout { .. }) => "TIMEOUT".to_string(),
            Self::Transport(TransportError::HttpStatus { status, .. }) | Self::HttpStatus { status, .. } => {
                format!("HTTP {status}")
            }
            Self::Transport(_) => "NETWORK".to_string(),
            Self::PartialTransfer { status, .. } => format!("PARTIAL {status}"),
            Self::MalformedRange { .. } => "RANGE".to_string(),
            Self::Io { .. } => "IO".to_string(),
            Self::Task { .. } => "TASK".to_string(),
        }
    }
}
