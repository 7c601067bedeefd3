//! Lecture Downloader Core Library
//!
//! This library signs a student in to the university LMS, lists the courses
//! reachable with that session, discovers every downloadable lecture material
//! of a course, and downloads the selected materials.
//!
//! # Architecture
//!
//! The library is organized into the following modules, leaves first:
//! - [`transport`] - Shared HTTP client with cookie jar and timeout policy
//! - [`auth`] - Password and push-approval single-sign-on handshakes
//! - [`catalog`] - Link-header paginated course listing grouped by term
//! - [`resolver`] - Concurrent material discovery across module and board backends
//! - [`download`] - Concurrent, chunked, resumable download manager
//! - [`service`] - Facade wiring the stages together for callers
//!
//! Each stage only consumes the output of the stage before it.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod download;
pub mod pool;
pub mod resolver;
pub mod service;
pub mod transport;
pub(crate) mod user_agent;
pub(crate) mod util;

// Re-export commonly used types
pub use auth::{
    ApprovalOutcome, AuthError, AuthFailure, AuthMethod, AuthOutcome, Credential,
    PushAuthenticator, SessionAuthenticator, Trial, authenticate,
};
pub use catalog::{CatalogError, Course, CourseCatalog, SemesterMap, Term, TermPeriod};
pub use config::{EngineConfig, HttpTimeouts, ServiceEndpoints};
pub use download::{
    ContentRange, DEFAULT_CHUNK_SIZE, DownloadError, DownloadManager, DownloadOutcome,
    DownloadRequest, HeaderProfile, ProgressCallback,
};
pub use pool::default_worker_count;
pub use resolver::{Material, MaterialKind, MaterialResolver, MaterialSource, ResolveError};
pub use service::LectureService;
pub use transport::{Transport, TransportError};
