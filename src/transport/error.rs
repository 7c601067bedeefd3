//! Error types for the shared HTTP transport.

use thiserror::Error;

/// Errors raised by [`Transport`](super::Transport) calls.
///
/// Every variant carries the protocol step that issued the request so a
/// failure in a multi-step exchange can be located without a stack trace.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level failure (DNS, connection refused, TLS, body read).
    #[error("[{step}] network error requesting {url}: {source}")]
    Network {
        /// Protocol step that issued the request.
        step: String,
        /// Request URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The per-request deadline elapsed.
    #[error("[{step}] timeout requesting {url}")]
    Timeout {
        /// Protocol step that issued the request.
        step: String,
        /// Request URL.
        url: String,
    },

    /// The server answered with a status the step does not accept.
    #[error("[{step}] unexpected HTTP {status} from {url}")]
    HttpStatus {
        /// Protocol step that issued the request.
        step: String,
        /// Request URL.
        url: String,
        /// Received status code.
        status: u16,
    },

    /// The client builder panicked even with system proxy lookup disabled.
    #[error("HTTP {what} builder panicked")]
    BuildPanicked {
        /// What was being built.
        what: &'static str,
    },

    /// Building the client or a request failed.
    #[error("failed to build HTTP {what}: {source}")]
    Build {
        /// What was being built (`client` or `request`).
        what: &'static str,
        /// Underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Maps a client error to `Timeout` or `Network`.
    pub fn from_reqwest(step: impl Into<String>, url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(step, url)
        } else {
            Self::network(step, url, source)
        }
    }

    /// Creates a network error.
    pub fn network(step: impl Into<String>, url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            step: step.into(),
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(step: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Timeout {
            step: step.into(),
            url: url.into(),
        }
    }

    /// Creates an unexpected-status error.
    pub fn http_status(step: impl Into<String>, url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            step: step.into(),
            url: url.into(),
            status,
        }
    }

    /// Creates a builder error.
    pub fn build(what: &'static str, source: reqwest::Error) -> Self {
        Self::Build { what, source }
    }

    /// Creates an error for a builder that panicked.
    pub fn build_panicked(what: &'static str) -> Self {
        Self::BuildPanicked { what }
    }

    /// Returns true when the request deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// HTTP status code, when the failure was a status mismatch.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
