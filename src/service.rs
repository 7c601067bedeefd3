//! Facade wiring authentication, catalog, resolution and download together.

use std::path::Path;

use tracing::instrument;

use crate::auth::{self, ApprovalOutcome, AuthError, AuthMethod, AuthOutcome, Credential, PushAuthenticator};
use crate::catalog::{CatalogError, Course, CourseCatalog, SemesterMap};
use crate::config::EngineConfig;
use crate::download::{DownloadManager, DownloadOutcome, DownloadRequest};
use crate::resolver::{Material, MaterialResolver, ResolveError};
use crate::transport::{Transport, TransportError};

/// Entry point for callers: one configuration, one shared transport.
///
/// Authentication always runs on its own fresh transport so a failed attempt
/// never leaves cookies behind; every later stage shares [`Transport`].
#[derive(Debug, Clone)]
pub struct LectureService {
    config: EngineConfig,
    transport: Transport,
}

impl LectureService {
    /// Builds the service and its shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] if the HTTP client cannot be built.
    pub fn new(config: EngineConfig) -> Result<Self, TransportError> {
        let transport = Transport::new(config.timeouts)?;
        Ok(Self { config, transport })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Sends a push approval request to `principal`'s device.
    ///
    /// # Errors
    ///
    /// See [`PushAuthenticator::send_approval`].
    pub async fn send_push(&self, principal: &str) -> Result<ApprovalOutcome, AuthError> {
        PushAuthenticator::new(&self.config).send_approval(principal).await
    }

    /// Signs `principal` in with a password or an approved push trial.
    ///
    /// # Errors
    ///
    /// See [`auth::authenticate`].
    pub async fn authenticate(&self, principal: &str, method: AuthMethod) -> Result<AuthOutcome, AuthError> {
        auth::authenticate(&self.config, principal, method).await
    }

    /// Lists the signed-in user's courses grouped by term.
    ///
    /// # Errors
    ///
    /// See [`CourseCatalog::list_by_semester`].
    pub async fn list_courses(&self, credential: &Credential) -> Result<SemesterMap, CatalogError> {
        CourseCatalog::new(self.transport.clone(), &self.config)
            .list_by_semester(credential)
            .await
    }

    /// Discovers the downloadable materials of `course`.
    ///
    /// # Errors
    ///
    /// See [`MaterialResolver::resolve_course_id`].
    pub async fn resolve_materials(&self, credential: &Credential, course: &Course) -> Result<Vec<Material>, ResolveError> {
        self.resolve_course_id(credential, &course.id).await
    }

    /// Discovers the materials of the course with id `course_id`.
    ///
    /// # Errors
    ///
    /// See [`MaterialResolver::resolve_course_id`].
    #[instrument(skip(self, credential))]
    pub async fn resolve_course_id(
        &self,
        credential: &Credential,
        course_id: &str,
    ) -> Result<Vec<Material>, ResolveError> {
        MaterialResolver::new(self.transport.clone(), &self.config)
            .resolve_course_id(credential, course_id)
            .await
    }

    /// Downloads `requests` into `dest`, one outcome per request in order.
    pub async fn download(&self, requests: Vec<DownloadRequest>, dest: &Path) -> Vec<DownloadOutcome> {
        DownloadManager::new(self.transport.clone(), &self.config)
            .download(requests, dest)
            .await
    }
}
