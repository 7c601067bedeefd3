//! Error types for material resolution.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Errors that end a discovery pipeline.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A backend request failed or returned an unexpected status.
    #[error("material lookup failed: {0}")]
    Transport(#[from] TransportError),

    /// A backend response lacked an expected field or element.
    #[error("could not parse {url}: {detail}{}", saved_note(.saved.as_ref()))]
    Parse {
        /// Response URL.
        url: String,
        /// What was missing.
        detail: String,
        /// Where a copy of the offending body was written, if anywhere.
        saved: Option<PathBuf>,
    },

    /// Writing a diagnostic copy of a response failed.
    #[error("could not write diagnostic copy to {path}: {source}")]
    Diagnostics {
        /// Target path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

fn saved_note(saved: Option<&PathBuf>) -> String {
    saved.map_or_else(String::new, |path| format!(" (response saved to {})", path.display()))
}

impl ResolveError {
    /// Creates a parse error without a saved copy.
    pub fn parse(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            detail: detail.into(),
            saved: None,
        }
    }

    /// Creates a parse error pointing at a saved copy of the body.
    pub fn parse_saved(url: impl Into<String>, detail: impl Into<String>, saved: Option<PathBuf>) -> Self {
        Self::Parse {
            url: url.into(),
            detail: detail.into(),
            saved,
        }
    }

    /// Creates a diagnostics IO error.
    pub fn diagnostics(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Diagnostics {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_mentions_saved_copy() {
        let error = ResolveError::parse_saved(
            "https://lcms.example.com/content.php?content_id=abc",
            "missing element 'content_type'",
            Some(PathBuf::from("/tmp/parse_failed_abc.xml")),
        );
        let text = error.to_string();
        assert!(text.contains("missing element 'content_type'"));
        assert!(text.contains("/tmp/parse_failed_abc.xml"));
    }

    #[test]
    fn test_parse_display_without_saved_copy() {
        let error = ResolveError::parse("https://x/", "bad json");
        assert_eq!(error.to_string(), "could not parse https://x/: bad json");
    }
}
