//! Password-based SSO handshake.
//!
//! The identity provider checks the principal and secret first; the LMS
//! session is then obtained by walking the SSO bridge, which reissues the
//! identity session as a one-time encrypted password for the LMS login form.

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, REFERER};
use tracing::{debug, info, instrument};

use super::crypto::LoginChallenge;
use super::error::{AuthError, StepError};
use super::form::{HiddenForm, RETRY_FIELD};
use super::{AuthOutcome, Credential};
use crate::config::{EngineConfig, HttpTimeouts, ServiceEndpoints};
use crate::transport::Transport;

/// Cookie holding the primary LMS session.
pub const SESSION_COOKIE: &str = "_normandy_session";

/// Cookie holding the API bearer token.
pub const API_TOKEN_COOKIE: &str = "xn_api_token";

/// Form carrying identity-provider results and SSO handoff state.
pub(crate) const SEND_FORM_ID: &str = "form-send";

const LOGIN_FORM_ID: &str = "login_form";
const PASSWORD_FIELD: &str = "pseudonym_session[password]";
const IDENTITY_AGENT_ID: &str = "2";

/// Runs the password handshake; each call uses a fresh cookie jar.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    endpoints: ServiceEndpoints,
    timeouts: HttpTimeouts,
}

impl SessionAuthenticator {
    /// Creates an authenticator for the configured endpoints.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            timeouts: config.timeouts,
        }
    }

    /// Signs in with a principal and secret.
    ///
    /// Rejections and timeouts come back as [`AuthOutcome::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when a step answers with an unexpected status,
    /// a required form/cookie/key is missing, or decryption fails.
    #[instrument(skip(self, secret))]
    pub async fn login(&self, principal: &str, secret: &str) -> Result<AuthOutcome, AuthError> {
        let transport = Transport::new(self.timeouts).map_err(AuthError::Transport)?;
        let result: Result<Credential, StepError> = async {
            identity_login(&transport, &self.endpoints, principal, secret).await?;
            bridge_to_lms(&transport, &self.endpoints).await
        }
        .await;
        settle(result)
    }
}

/// Converts a handshake result into the public outcome.
pub(crate) fn settle(result: Result<Credential, StepError>) -> Result<AuthOutcome, AuthError> {
    match result {
        Ok(credential) => {
            info!("authentication succeeded");
            Ok(AuthOutcome::Authenticated(credential))
        }
        Err(StepError::Failed(failure)) => {
            info!(code = %failure.code, "authentication rejected");
            Ok(AuthOutcome::Failed(failure))
        }
        Err(StepError::Fatal(error)) => Err(error),
    }
}

/// Checks an identity-provider result page for a rejection.
///
/// A result form without the `reTry` field is a protocol error, never an
/// acceptance.
pub(crate) fn check_identity_result(step: &'static str, html: &str) -> Result<(), StepError> {
    let form = HiddenForm::parse(html, SEND_FORM_ID)
        .ok_or_else(|| AuthError::parse(step, format!("form '{SEND_FORM_ID}' not found")))?;
    match form.verdict() {
        Some(Ok(())) => Ok(()),
        Some(Err(failure)) => Err(StepError::Failed(failure)),
        None => Err(AuthError::parse(step, format!("field '{RETRY_FIELD}' missing")).into()),
    }
}

async fn identity_login(
    transport: &Transport,
    endpoints: &ServiceEndpoints,
    principal: &str,
    secret: &str,
) -> Result<(), StepError> {
    const STEP: &str = "identity-login";
    let url = format!("{}/authentication/idpw/loginProcess", endpoints.sso);
    let request = transport.post(&url).form(&[
        ("id", principal),
        ("pw", secret),
        ("agentId", IDENTITY_AGENT_ID),
    ]);
    let response = transport.send(STEP, request).await?;
    let response = Transport::expect_status(STEP, response, StatusCode::OK)?;
    let body = Transport::text(STEP, response).await?;
    check_identity_result(STEP, &body)?;
    debug!(step = STEP, "identity provider accepted credentials");
    Ok(())
}

/// Walks the SSO bridge from an identity session to LMS cookies.
///
/// Shared by the password and push paths; `transport` must already hold the
/// identity-provider session cookie.
pub(crate) async fn bridge_to_lms(
    transport: &Transport,
    endpoints: &ServiceEndpoints,
) -> Result<Credential, StepError> {
    prime(transport, endpoints).await?;
    bridge_session(transport, endpoints).await?;
    let descriptor = login_descriptor(transport, endpoints).await?;
    register_session(transport, endpoints, &descriptor).await?;
    let (login_form, challenge_url) = login_challenge(transport, endpoints).await?;
    final_login(transport, endpoints, &login_form, &challenge_url).await?;
    extract_credential(transport, endpoints)
}

async fn prime(transport: &Transport, endpoints: &ServiceEndpoints) -> Result<(), StepError> {
    const STEP: &str = "prime";
    let url = format!("{}/", endpoints.lms);
    let request = transport.get(&url).header(ACCEPT, "text/html");
    let response = transport.send(STEP, request).await?;
    Transport::expect_status(STEP, response, StatusCode::OK)?;
    debug!(step = STEP, "baseline cookies established");
    Ok(())
}

async fn bridge_session(transport: &Transport, endpoints: &ServiceEndpoints) -> Result<(), StepError> {
    const STEP: &str = "bridge-session";
    let url = format!("{}/sso/business.php", endpoints.bridge);
    let response = transport.send(STEP, transport.post(&url)).await?;
    Transport::expect_status(STEP, response, StatusCode::OK)?;
    debug!(step = STEP, "bridging session issued");
    Ok(())
}

async fn login_descriptor(
    transport: &Transport,
    endpoints: &ServiceEndpoints,
) -> Result<HiddenForm, StepError> {
    const STEP: &str = "login-descriptor";
    let url = format!("{}/login.html?agentId=311", endpoints.sso);
    let response = transport.send(STEP, transport.post(&url)).await?;
    let response = Transport::expect_status(STEP, response, StatusCode::OK)?;
    let body = Transport::text(STEP, response).await?;
    let form = HiddenForm::parse(&body, SEND_FORM_ID)
        .ok_or_else(|| AuthError::parse(STEP, format!("form '{SEND_FORM_ID}' not found")))?;
    debug!(step = STEP, fields = form.len(), "login descriptor parsed");
    Ok(form)
}

async fn register_session(
    transport: &Transport,
    endpoints: &ServiceEndpoints,
    descriptor: &HiddenForm,
) -> Result<(), StepError> {
    const STEP: &str = "register-session";
    let url = format!("{}/sso/checkauth.php", endpoints.bridge);
    let request = transport.post(&url).form(descriptor.fields());
    let response = transport.send(STEP, request).await?;
    Transport::expect_status(STEP, response, StatusCode::OK)?;
    debug!(step = STEP, "bridging session registered");
    Ok(())
}

async fn login_challenge(
    transport: &Transport,
    endpoints: &ServiceEndpoints,
) -> Result<(HiddenForm, String), StepError> {
    const STEP: &str = "login-challenge";
    let url = format!("{}/sso/agentProc.php", endpoints.bridge);
    let request = transport.post(&url).header(ACCEPT, "text/html");
    let response = transport.send(STEP, request).await?;
    let response = Transport::expect_status(STEP, response, StatusCode::OK)?;
    let final_url = response.url().to_string();
    let body = Transport::text(STEP, response).await?;

    let mut form = HiddenForm::parse(&body, LOGIN_FORM_ID)
        .ok_or_else(|| AuthError::parse(STEP, format!("form '{LOGIN_FORM_ID}' not found")))?;
    let challenge = LoginChallenge::extract(&body)
        .ok_or_else(|| AuthError::parse(STEP, "loginCryption call not found"))?;
    let password = challenge.decrypt()?;
    form.set(PASSWORD_FIELD, password.expose());
    debug!(step = STEP, fields = form.len(), "session password recovered");
    Ok((form, final_url))
}

async fn final_login(
    transport: &Transport,
    endpoints: &ServiceEndpoints,
    form: &HiddenForm,
    referer: &str,
) -> Result<(), StepError> {
    const STEP: &str = "final-login";
    let url = format!("{}/login/canvas", endpoints.lms);
    let request = transport
        .post(&url)
        .header(ACCEPT, "text/html")
        .header(REFERER, referer)
        .form(form.fields());
    let response = transport.send(STEP, request).await?;
    Transport::expect_status(STEP, response, StatusCode::OK)?;
    debug!(step = STEP, "LMS login submitted");
    Ok(())
}

fn extract_credential(transport: &Transport, endpoints: &ServiceEndpoints) -> Result<Credential, StepError> {
    const STEP: &str = "extract-result";
    let url = format!("{}/", endpoints.lms);
    let session = transport
        .cookie(&url, SESSION_COOKIE)
        .ok_or_else(|| AuthError::parse(STEP, format!("cookie '{SESSION_COOKIE}' missing")))?;
    let api_token = transport
        .cookie(&url, API_TOKEN_COOKIE)
        .ok_or_else(|| AuthError::parse(STEP, format!("cookie '{API_TOKEN_COOKIE}' missing")))?;
    Ok(Credential::new(session, api_token))
}
