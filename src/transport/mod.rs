//! Shared HTTP transport with cookie persistence and timeout policy.
//!
//! One [`Transport`] wraps a single `reqwest::Client` and the cookie jar it
//! writes into. Clones share both, so one instance can serve every task of a
//! worker pool while the SSO handshake accumulates cookies across steps.

mod error;

use std::panic::{AssertUnwindSafe, catch_unwind, set_hook, take_hook};
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, ClientBuilder, Proxy, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

pub use error::TransportError;

use crate::config::HttpTimeouts;
use crate::user_agent;

/// Cookie-carrying HTTP client shared by every engine component.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    jar: Arc<Jar>,
}

impl Transport {
    /// Builds a transport with a fresh, empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] if the client cannot be constructed,
    /// or [`TransportError::BuildPanicked`] if the builder panicked with and
    /// without system proxy lookup.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, TransportError> {
        let jar = Arc::new(Jar::default());
        let client = build_client(Arc::clone(&jar), timeouts)?;
        Ok(Self { client, jar })
    }

    /// Starts a GET request.
    #[must_use]
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Starts a POST request.
    #[must_use]
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Sends a request, mapping client failures to `Timeout` or `Network`.
    ///
    /// Any status is returned as-is; use [`Transport::expect_status`] where a
    /// step requires a specific one.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request cannot be built or sent.
    pub async fn send(&self, step: &str, request: RequestBuilder) -> Result<Response, TransportError> {
        let request = request
            .build()
            .map_err(|source| TransportError::build("request", source))?;
        let url = request.url().to_string();
        debug!(step, method = %request.method(), url = %url, "sending request");
        self.client
            .execute(request)
            .await
            .map_err(|source| TransportError::from_reqwest(step, url, source))
    }

    /// Passes the response through only if its status equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::HttpStatus`] on any other status.
    pub fn expect_status(
        step: &str,
        response: Response,
        expected: StatusCode,
    ) -> Result<Response, TransportError> {
        let status = response.status();
        if status == expected {
            Ok(response)
        } else {
            Err(TransportError::http_status(
                step,
                response.url().as_str(),
                status.as_u16(),
            ))
        }
    }

    /// Reads the whole body as text.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the body cannot be read in time.
    pub async fn text(step: &str, response: Response) -> Result<String, TransportError> {
        let url = response.url().to_string();
        response
            .text()
            .await
            .map_err(|source| TransportError::from_reqwest(step, url, source))
    }

    /// Returns the value of cookie `name` that the jar would send to `url`.
    #[must_use]
    pub fn cookie(&self, url: &str, name: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let header = self.jar.cookies(&url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, name)
    }
}

/// Finds `name` in a `Cookie` request header value (`a=1; b=2`).
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Where the client builder takes proxy settings from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProxySource {
    /// Platform proxy configuration, as reqwest reads it by default.
    System,
    /// Only `*_PROXY` environment variables.
    Environment,
}

/// Builds the client, retrying without system proxy lookup when that lookup
/// panics (seen in sandboxed macOS runners).
fn build_client(jar: Arc<Jar>, timeouts: HttpTimeouts) -> Result<Client, TransportError> {
    let attempt = match guarded_build(Arc::clone(&jar), timeouts, ProxySource::System) {
        Err(BuildFailure::Panicked) => {
            warn!("system proxy lookup panicked; building HTTP client from environment proxies");
            guarded_build(jar, timeouts, ProxySource::Environment)
        }
        other => other,
    };
    attempt.map_err(|failure| match failure {
        BuildFailure::Panicked => TransportError::build_panicked("client"),
        BuildFailure::Rejected(source) => TransportError::build("client", source),
    })
}

enum BuildFailure {
    Panicked,
    Rejected(reqwest::Error),
}

// The panic hook still fires under catch_unwind; it is muted for the duration.
static PANIC_HOOK_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn guarded_build(jar: Arc<Jar>, timeouts: HttpTimeouts, proxies: ProxySource) -> Result<Client, BuildFailure> {
    let _hook_guard = PANIC_HOOK_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let previous_hook = take_hook();
    set_hook(Box::new(|_| {}));
    let outcome = catch_unwind(AssertUnwindSafe(move || {
        #[cfg(test)]
        inject_build_panic();

        let builder = base_client_builder(jar, timeouts);
        let builder = match proxies {
            ProxySource::System => builder,
            ProxySource::Environment => with_env_proxies(builder.no_proxy()),
        };
        builder.build().map_err(BuildFailure::Rejected)
    }));
    set_hook(previous_hook);
    outcome.map_err(|_| BuildFailure::Panicked)?
}

fn base_client_builder(jar: Arc<Jar>, timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
        .cookie_provider(jar)
}

const HTTPS_PROXY_VARS: [&str; 4] = ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"];
const HTTP_PROXY_VARS: [&str; 4] = ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"];

fn with_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = first_env_value(&HTTPS_PROXY_VARS).and_then(|url| Proxy::https(&url).ok()) {
        builder = builder.proxy(proxy);
    }
    if let Some(proxy) = first_env_value(&HTTP_PROXY_VARS).and_then(|url| Proxy::http(&url).ok()) {
        builder = builder.proxy(proxy);
    }
    builder
}

fn first_env_value(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let value = std::env::var(name).ok()?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
thread_local! {
    static INJECTED_BUILD_PANICS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

#[cfg(test)]
fn inject_build_panic() {
    let pending = INJECTED_BUILD_PANICS.with(std::cell::Cell::get);
    if pending > 0 {
        INJECTED_BUILD_PANICS.with(|cell| cell.set(pending - 1));
        panic!("injected HTTP client builder panic");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_cookie_picks_named_pair() {
        let header = "_normandy_session=abc123; xn_api_token=tok.en=x";
        assert_eq!(find_cookie(header, "_normandy_session").as_deref(), Some("abc123"));
        assert_eq!(find_cookie(header, "xn_api_token").as_deref(), Some("tok.en=x"));
        assert_eq!(find_cookie(header, "missing"), None);
    }

    #[test]
    fn test_cookie_reads_back_from_jar() {
        let transport = Transport::new(HttpTimeouts::default()).unwrap();
        let url = Url::parse("https://lms.example.com/").unwrap();
        transport
            .jar
            .add_cookie_str("_normandy_session=s3ss; Path=/", &url);
        assert_eq!(
            transport.cookie("https://lms.example.com/api", "_normandy_session").as_deref(),
            Some("s3ss")
        );
        assert_eq!(transport.cookie("https://other.example.com/", "_normandy_session"), None);
        assert_eq!(transport.cookie("not a url", "_normandy_session"), None);
    }

    #[test]
    fn test_clones_share_cookie_jar() {
        let transport = Transport::new(HttpTimeouts::default()).unwrap();
        let clone = transport.clone();
        let url = Url::parse("https://lms.example.com/").unwrap();
        clone.jar.add_cookie_str("k=v; Path=/", &url);
        assert_eq!(transport.cookie("https://lms.example.com/", "k").as_deref(), Some("v"));
    }

    #[test]
    fn test_build_recovers_from_system_proxy_panic() {
        INJECTED_BUILD_PANICS.with(|cell| cell.set(1));
        let transport = Transport::new(HttpTimeouts::default());
        INJECTED_BUILD_PANICS.with(|cell| cell.set(0));
        assert!(transport.is_ok());
    }

    #[test]
    fn test_build_reports_repeated_panic_as_error() {
        INJECTED_BUILD_PANICS.with(|cell| cell.set(2));
        let transport = Transport::new(HttpTimeouts::default());
        INJECTED_BUILD_PANICS.with(|cell| cell.set(0));
        match transport {
            Err(TransportError::BuildPanicked { what }) => assert_eq!(what, "client"),
            Err(other) => panic!("expected builder panic error, got {other}"),
            Ok(_) => panic!("client must not be built after two panics"),
        }
    }
}
