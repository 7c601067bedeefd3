//! Course listing grouped by semester.
//!
//! The courses collection is paginated through `Link` headers, so pages are
//! fetched one after another: each cursor is only known once the previous
//! page has arrived.

mod link;
mod term;

use std::collections::{BTreeMap, HashSet};

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, COOKIE};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub use link::PageLinks;
pub use term::{Term, TermPeriod};

use crate::auth::{Credential, SESSION_COOKIE};
use crate::config::EngineConfig;
use crate::transport::{Transport, TransportError};
use crate::util::deserialize_id;

const COURSES_PATH: &str = "/api/v1/courses?include=term&per_page=50";

/// Courses keyed by term, each list in catalog order.
pub type SemesterMap = BTreeMap<Term, Vec<Course>>;

/// Errors raised while listing courses.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A page request failed or returned a non-200 status.
    #[error("course listing failed: {0}")]
    Transport(#[from] TransportError),

    /// A page body was not the expected JSON array.
    #[error("could not parse course page {url}: {detail}")]
    Parse {
        /// Page URL.
        url: String,
        /// Parser message.
        detail: String,
    },
}

impl CatalogError {
    /// Creates a parse error.
    pub fn parse(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            detail: detail.into(),
        }
    }
}

/// A course the session can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    /// LMS course id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning term.
    pub term: Term,
}

#[derive(Debug, Deserialize)]
struct RawCourse {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    term: Option<RawTerm>,
}

#[derive(Debug, Deserialize)]
struct RawTerm {
    #[serde(default)]
    name: Option<String>,
}

/// Reads the course catalog with an authenticated session.
#[derive(Debug, Clone)]
pub struct CourseCatalog {
    transport: Transport,
    lms_base: String,
}

impl CourseCatalog {
    /// Creates a catalog reader sharing `transport`.
    #[must_use]
    pub fn new(transport: Transport, config: &EngineConfig) -> Self {
        Self {
            transport,
            lms_base: config.endpoints.lms.clone(),
        }
    }

    /// Lists every course whose term is recognized, grouped by term.
    ///
    /// Pagination ends when a page has no `next` link, when the page just
    /// fetched is the one the previous page announced as `last`, or when
    /// `next` points at a page already fetched.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when a page cannot be fetched or parsed.
    #[instrument(skip(self, credential))]
    pub async fn list_by_semester(&self, credential: &Credential) -> Result<SemesterMap, CatalogError> {
        let mut semesters = SemesterMap::new();
        let mut visited = HashSet::new();
        let mut previous_last: Option<String> = None;
        let mut next = Some(format!("{}{COURSES_PATH}", self.lms_base));

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                debug!(url = %url, "next link already fetched; stopping");
                break;
            }
            let (courses, links) = self.fetch_page(&url, credential).await?;
            for raw in courses {
                if let Some(course) = normalize(raw) {
                    semesters.entry(course.term).or_default().push(course);
                }
            }
            if previous_last.as_deref() == Some(url.as_str()) {
                debug!(url = %url, "reached announced last page");
                break;
            }
            previous_last = links.last;
            next = links.next;
        }

        info!(
            pages = visited.len(),
            terms = semesters.len(),
            courses = semesters.values().map(Vec::len).sum::<usize>(),
            "course catalog loaded"
        );
        Ok(semesters)
    }

    async fn fetch_page(
        &self,
        url: &str,
        credential: &Credential,
    ) -> Result<(Vec<RawCourse>, PageLinks), CatalogError> {
        const STEP: &str = "course-page";
        let request = self
            .transport
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", credential.api_token()))
            .header(COOKIE, format!("{SESSION_COOKIE}={}", credential.session_token()));
        let response = self.transport.send(STEP, request).await?;
        let response = Transport::expect_status(STEP, response, StatusCode::OK)?;
        let links = PageLinks::from_headers(response.headers());
        let body = Transport::text(STEP, response).await?;
        let courses = parse_course_page(&body).map_err(|detail| CatalogError::parse(url, detail))?;
        debug!(url = %url, entries = courses.len(), has_next = links.next.is_some(), "course page fetched");
        Ok((courses, links))
    }
}

/// Parses a page body, skipping any prefix before the JSON array.
fn parse_course_page(body: &str) -> Result<Vec<RawCourse>, String> {
    let start = body.find('[').ok_or_else(|| "no JSON array in body".to_string())?;
    serde_json::from_str(&body[start..]).map_err(|e| e.to_string())
}

fn normalize(raw: RawCourse) -> Option<Course> {
    let term_name = raw.term.and_then(|term| term.name)?;
    let Some(term) = Term::parse(&term_name) else {
        debug!(course_id = %raw.id, term = %term_name, "skipping course with unrecognized term");
        return None;
    };
    let name = raw.name?;
    Some(Course {
        id: raw.id,
        name,
        term,
    })
}
