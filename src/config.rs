//! Engine configuration: upstream endpoints, HTTP timeouts and pool size.
//!
//! Nothing here is persisted; callers build an [`EngineConfig`] from defaults,
//! CLI flags or environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::pool::default_worker_count;

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default per-request timeout (30 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_SSO_BASE_URL: &str = "https://knusso.knu.ac.kr";
const DEFAULT_BRIDGE_BASE_URL: &str = "https://lms1.knu.ac.kr";
const DEFAULT_LMS_BASE_URL: &str = "https://canvas.knu.ac.kr";
const DEFAULT_CONTENT_BASE_URL: &str = "https://lcms.knu.ac.kr";
const DEFAULT_PUSH_BASE_URL: &str = "https://appfn.knu.ac.kr";

/// Base URLs of every upstream service the engine talks to.
///
/// Values never carry a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    /// Identity provider (SSO login forms, push login).
    pub sso: String,
    /// SSO bridge issuing the intermediary session.
    pub bridge: String,
    /// LMS origin (login target, REST API).
    pub lms: String,
    /// Content host serving descriptors and shared documents.
    pub content: String,
    /// Push-notification service.
    pub push: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            sso: DEFAULT_SSO_BASE_URL.to_string(),
            bridge: DEFAULT_BRIDGE_BASE_URL.to_string(),
            lms: DEFAULT_LMS_BASE_URL.to_string(),
            content: DEFAULT_CONTENT_BASE_URL.to_string(),
            push: DEFAULT_PUSH_BASE_URL.to_string(),
        }
    }
}

impl ServiceEndpoints {
    /// Points every endpoint at one origin, e.g. a local mock server.
    #[must_use]
    pub fn single_origin(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            sso: base.clone(),
            bridge: base.clone(),
            lms: base.clone(),
            content: base.clone(),
            push: base,
        }
    }
}

/// Connect and per-request timeouts applied to every HTTP call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// TCP/TLS connect timeout.
    pub connect: Duration,
    /// Whole-request deadline, per individual call.
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upstream base URLs.
    pub endpoints: ServiceEndpoints,
    /// HTTP timeouts.
    pub timeouts: HttpTimeouts,
    /// Worker pool size for resolution and download fan-out.
    pub workers: usize,
    /// Where unparsable content descriptors are written for diagnosis.
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoints: ServiceEndpoints::default(),
            timeouts: HttpTimeouts::default(),
            workers: default_worker_count(),
            diagnostics_dir: None,
        }
    }
}

impl EngineConfig {
    /// Configuration with all endpoints on one origin and default timeouts.
    #[must_use]
    pub fn for_origin(base: &str) -> Self {
        Self {
            endpoints: ServiceEndpoints::single_origin(base),
            ..Self::default()
        }
    }
}
