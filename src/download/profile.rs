//! Request header profiles per material kind.
//!
//! Profiles are immutable constants passed by value into each download task.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::resolver::MaterialKind;
use crate::user_agent::BROWSER_USER_AGENT;

/// Fixed header set sent with every request of one material kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderProfile {
    headers: &'static [(&'static str, &'static str)],
}

impl HeaderProfile {
    /// Documents: plain browser identification.
    pub const DOCUMENT: Self = Self {
        headers: &[("user-agent", BROWSER_USER_AGENT), ("accept", "*/*")],
    };

    /// Video: the media host only starts streaming after Range negotiation,
    /// and must not compress the body.
    pub const VIDEO: Self = Self {
        headers: &[
            ("user-agent", BROWSER_USER_AGENT),
            ("accept", "*/*"),
            ("accept-language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
            ("accept-encoding", "identity;q=1, *;q=0"),
            ("range", "bytes=0-"),
        ],
    };

    /// Profile for `kind`.
    #[must_use]
    pub fn for_kind(kind: MaterialKind) -> Self {
        match kind {
            MaterialKind::Document => Self::DOCUMENT,
            MaterialKind::Video => Self::VIDEO,
        }
    }

    /// Headers as a map, for `RequestBuilder::headers`.
    #[must_use]
    pub fn header_map(&self) -> HeaderMap {
        self.headers
            .iter()
            .map(|(name, value)| {
                (
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                )
            })
            .collect()
    }
}
