//! RFC 5988 `Link` header parsing for cursor pagination.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::{HeaderMap, LINK};

use crate::util::compile_static_regex;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"<([^>]+)>\s*;\s*rel="([a-z]+)""#));

/// `next` and `last` cursors of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// URL of the following page.
    pub next: Option<String>,
    /// URL of the final page.
    pub last: Option<String>,
}

impl PageLinks {
    /// Parses a raw header value such as `<u1>; rel="next", <u2>; rel="last"`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut links = Self::default();
        for caps in LINK_RE.captures_iter(value) {
            let url = caps[1].to_string();
            match &caps[2] {
                "next" => links.next = Some(url),
                "last" => links.last = Some(url),
                _ => {}
            }
        }
        links
    }

    /// Parses every `Link` header of a response.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let joined = headers
            .get_all(LINK)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        Self::parse(&joined)
    }
}
