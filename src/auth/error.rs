//! Error and failure types for the SSO handshakes.

use std::fmt;

use thiserror::Error;

use crate::transport::TransportError;

/// Fatal errors that abort an authentication attempt.
///
/// Timeouts and well-formed rejections are not errors; they come back as an
/// [`AuthFailure`] value.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A step the protocol requires to succeed failed at the HTTP level.
    #[error("authentication transport failure: {0}")]
    Transport(#[source] TransportError),

    /// An expected form, field, cookie or key was missing from a response.
    #[error("[{step}] could not parse response: {detail}")]
    Parse {
        /// Protocol step whose response was malformed.
        step: &'static str,
        /// What was missing.
        detail: String,
    },

    /// The embedded session key or ciphertext could not be used.
    #[error("session password decryption failed: {detail}")]
    Crypto {
        /// Failure description.
        detail: String,
    },
}

impl AuthError {
    /// Creates a parse error for `step`.
    pub fn parse(step: &'static str, detail: impl Into<String>) -> Self {
        Self::Parse {
            step,
            detail: detail.into(),
        }
    }

    /// Creates a crypto error.
    pub fn crypto(detail: impl fmt::Display) -> Self {
        Self::Crypto {
            detail: detail.to_string(),
        }
    }
}

/// Structured, user-actionable authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    /// Provider result code, `"Timeout"` for deadline expiry.
    pub code: String,
    /// Provider message.
    pub message: String,
}

impl AuthFailure {
    /// Creates a failure with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Failure reported when any handshake step exceeds its deadline.
    #[must_use]
    pub fn timeout() -> Self {
        Self::new("Timeout", "the identity provider did not respond in time")
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Splits transport errors into a timeout failure or a fatal error.
///
/// Used with `?` inside the handshakes so a deadline at any step becomes an
/// [`AuthFailure`] instead of aborting.
pub(crate) enum StepError {
    Failed(AuthFailure),
    Fatal(AuthError),
}

impl From<TransportError> for StepError {
    fn from(error: TransportError) -> Self {
        if error.is_timeout() {
            Self::Failed(AuthFailure::timeout())
        } else {
            Self::Fatal(AuthError::Transport(error))
        }
    }
}

impl From<AuthError> for StepError {
    fn from(error: AuthError) -> Self {
        Self::Fatal(error)
    }
}
