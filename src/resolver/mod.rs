//! Material discovery for a course.
//!
//! A course's lecture materials live in two unrelated backends, each wrapped
//! by a [`MaterialSource`]:
//!
//! - [`ModuleSource`] - course modules whose items point at content
//!   descriptors on the legacy content host
//! - [`BoardSource`] - attachments of posts on the course's materials board
//!
//! [`MaterialResolver`] runs every registered source concurrently and
//! concatenates what they find. Every material it returns carries a URL that
//! can be fetched without further handshakes.

mod board;
mod descriptor;
mod error;
mod module;

pub use board::{BoardSource, MATERIALS_BOARD_TITLE};
pub use descriptor::{ContentKind, Descriptor, MissingElement, parse_descriptor};
pub use error::ResolveError;
pub use module::ModuleSource;

use std::fmt;

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use crate::auth::Credential;
use crate::catalog::Course;
use crate::config::EngineConfig;
use crate::transport::Transport;

/// How a material is served, which selects the download header profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Documents (slides, notes, attachments).
    Document,
    /// Streamed lecture video.
    Video,
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => f.pad("document"),
            Self::Video => f.pad("video"),
        }
    }
}

/// A directly fetchable lecture material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Display name, including the file extension.
    pub name: String,
    /// Content kind.
    pub kind: MaterialKind,
    /// Source URL.
    pub url: String,
}

impl Material {
    /// Creates a material.
    pub fn new(name: impl Into<String>, kind: MaterialKind, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            url: url.into(),
        }
    }
}

/// One content backend that can list a course's materials.
///
/// This trait uses `async_trait` so sources can be stored as
/// `Box<dyn MaterialSource>`.
#[async_trait]
pub trait MaterialSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Lists the materials this backend holds for `course_id`.
    async fn discover(&self, credential: &Credential, course_id: &str) -> Result<Vec<Material>, ResolveError>;
}

/// Runs every registered [`MaterialSource`] for a course.
pub struct MaterialResolver {
    sources: Vec<Box<dyn MaterialSource>>,
}

impl fmt::Debug for MaterialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialResolver")
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl MaterialResolver {
    /// Creates a resolver with the module and board sources.
    #[must_use]
    pub fn new(transport: Transport, config: &EngineConfig) -> Self {
        Self::with_sources(vec![
            Box::new(ModuleSource::new(transport.clone(), config)),
            Box::new(BoardSource::new(transport, config)),
        ])
    }

    /// Creates a resolver over an explicit source list.
    #[must_use]
    pub fn with_sources(sources: Vec<Box<dyn MaterialSource>>) -> Self {
        Self { sources }
    }

    /// Discovers the materials of `course`.
    ///
    /// # Errors
    ///
    /// See [`MaterialResolver::resolve_course_id`].
    pub async fn resolve(&self, credential: &Credential, course: &Course) -> Result<Vec<Material>, ResolveError> {
        self.resolve_course_id(credential, &course.id).await
    }

    /// Discovers the materials of the course with id `course_id`.
    ///
    /// All sources run to completion even when one fails. Output order is
    /// not significant, and the same file may appear twice if two backends
    /// expose it.
    ///
    /// # Errors
    ///
    /// Returns the first failure in source registration order; later
    /// failures are logged.
    #[instrument(skip(self, credential))]
    pub async fn resolve_course_id(
        &self,
        credential: &Credential,
        course_id: &str,
    ) -> Result<Vec<Material>, ResolveError> {
        let results = join_all(
            self.sources
                .iter()
                .map(|source| async move { (source.name(), source.discover(credential, course_id).await) }),
        )
        .await;

        let mut materials = Vec::new();
        let mut first_error = None;
        for (name, result) in results {
            match result {
                Ok(found) => {
                    info!(source = name, count = found.len(), "source finished");
                    materials.extend(found);
                }
                Err(error) => {
                    warn!(source = name, error = %error, "source failed");
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => {
                info!(count = materials.len(), "materials resolved");
                Ok(materials)
            }
        }
    }
}

/// Keeps every success, or returns the first failure after logging the rest.
pub(crate) fn first_failure<T>(what: &str, results: Vec<Result<T, ResolveError>>) -> Result<Vec<T>, ResolveError> {
    let mut values = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(error) if first_error.is_none() => first_error = Some(error),
            Err(error) => warn!(task = what, error = %error, "additional task failure"),
        }
    }
    first_error.map_or(Ok(values), Err)
}

/// GETs a bearer-authorized JSON resource.
pub(crate) async fn get_json<T: DeserializeOwned>(
    transport: &Transport,
    step: &str,
    url: &str,
    credential: &Credential,
) -> Result<T, ResolveError> {
    let request = transport.get(url).bearer_auth(credential.api_token());
    let response = transport.send(step, request).await?;
    let response = Transport::expect_status(step, response, StatusCode::OK)?;
    let body = Transport::text(step, response).await?;
    serde_json::from_str(&body).map_err(|e| ResolveError::parse(url, e.to_string()))
}
