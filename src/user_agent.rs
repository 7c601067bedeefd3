//! Shared User-Agent strings for SSO, API and download traffic.
//!
//! The identity provider and the content host serve different markup to
//! unrecognized clients, so every request identifies as a desktop browser.

/// Desktop browser User-Agent sent on every request.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// Default User-Agent for the shared transport.
#[must_use]
pub(crate) fn default_user_agent() -> &'static str {
    BROWSER_USER_AGENT
}
