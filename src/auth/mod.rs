//! Single-sign-on authentication against the university identity provider.
//!
//! Two handshakes produce the same [`Credential`]:
//! - [`SessionAuthenticator`] - principal + secret
//! - [`PushAuthenticator`] - approval on the companion app
//!
//! [`authenticate`] dispatches on [`AuthMethod`].

mod crypto;
mod error;
mod form;
mod push;
mod session;

use std::fmt;

use tracing::instrument;

pub use crypto::{LoginChallenge, SessionPassword};
pub use error::{AuthError, AuthFailure};
pub use form::HiddenForm;
pub use push::{ApprovalOutcome, PushAuthenticator};
pub use session::{API_TOKEN_COOKIE, SESSION_COOKIE, SessionAuthenticator};

use crate::config::EngineConfig;

/// LMS session tokens produced by a successful handshake.
///
/// Immutable; there is no renewal.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    session: String,
    api_token: String,
}

impl Credential {
    /// Builds a credential from its two tokens.
    pub fn new(session: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            api_token: api_token.into(),
        }
    }

    /// Primary LMS session cookie value.
    #[must_use]
    pub fn session_token(&self) -> &str {
        &self.session
    }

    /// Bearer token for the REST API.
    #[must_use]
    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("session", &"[REDACTED]")
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

/// Push-approval transaction id. Consumed by the login it authorizes.
#[derive(Debug, PartialEq, Eq)]
pub struct Trial(String);

impl Trial {
    /// Wraps a transaction id issued by the notification service.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Raw transaction id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How to prove the principal's identity.
pub enum AuthMethod {
    /// Password handshake.
    Password(String),
    /// Push handshake with an approved trial.
    Push(Trial),
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password([REDACTED])"),
            Self::Push(trial) => f.debug_tuple("Push").field(trial).finish(),
        }
    }
}

/// Result of a handshake that reached a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Signed in.
    Authenticated(Credential),
    /// Rejected by the provider, or a step timed out.
    Failed(AuthFailure),
}

impl AuthOutcome {
    /// The credential, if authenticated.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Authenticated(credential) => Some(credential),
            Self::Failed(_) => None,
        }
    }
}

/// Authenticates `principal` with the chosen method.
///
/// # Errors
///
/// Returns [`AuthError`] for transport, parse or decryption failures; see
/// [`SessionAuthenticator::login`].
#[instrument(skip(config, method))]
pub async fn authenticate(
    config: &EngineConfig,
    principal: &str,
    method: AuthMethod,
) -> Result<AuthOutcome, AuthError> {
    match method {
        AuthMethod::Password(secret) => {
            SessionAuthenticator::new(config)
                .login(principal, &secret)
                .await
        }
        AuthMethod::Push(trial) => {
            PushAuthenticator::new(config)
                .complete_login(principal, trial)
                .await
        }
    }
}
