//! Push-approval SSO handshake.
//!
//! [`PushAuthenticator::send_approval`] asks the companion app to prompt the
//! user; once the user approves, [`PushAuthenticator::complete_login`] trades
//! the resulting [`Trial`] for an identity session and walks the same SSO
//! bridge as the password path. Nothing here polls for approval.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::error::{AuthError, AuthFailure, StepError};
use super::session::{bridge_to_lms, check_identity_result, settle};
use super::{AuthOutcome, Credential, Trial};
use crate::config::{EngineConfig, HttpTimeouts, ServiceEndpoints};
use crate::transport::Transport;

const PUSH_AGENT_ID: &str = "2";
const PUSH_SITE_ID: &str = "SIT01KNUAC0000000000";
const PUSH_SERVICE_ID: &str = "SVC01SIT01KNUAC00000";

/// Result of asking for push approval.
#[derive(Debug)]
pub enum ApprovalOutcome {
    /// The notification was delivered; approve it, then complete the login.
    Sent(Trial),
    /// The notification service refused or timed out.
    Failed(AuthFailure),
}

#[derive(Debug, Deserialize)]
struct NotificationResponse {
    success: bool,
    #[serde(default)]
    code: Value,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<NotificationData>,
}

#[derive(Debug, Deserialize)]
struct NotificationData {
    #[serde(default)]
    success: bool,
    #[serde(rename = "trId", default)]
    tr_id: Option<String>,
}

/// Runs the push-approval handshake.
#[derive(Debug, Clone)]
pub struct PushAuthenticator {
    endpoints: ServiceEndpoints,
    timeouts: HttpTimeouts,
}

impl PushAuthenticator {
    /// Creates an authenticator for the configured endpoints.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            timeouts: config.timeouts,
        }
    }

    /// Sends a login notification to the principal's companion app.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Transport`] on a non-2xx answer or network
    /// failure, and [`AuthError::Parse`] when the body is not the expected
    /// JSON. Timeouts are reported as [`ApprovalOutcome::Failed`].
    #[instrument(skip(self))]
    pub async fn send_approval(&self, principal: &str) -> Result<ApprovalOutcome, AuthError> {
        const STEP: &str = "push-notification";
        let transport = Transport::new(self.timeouts).map_err(AuthError::Transport)?;
        let url = format!("{}/login/notification", self.endpoints.push);
        let request = transport
            .post(&url)
            .json(&serde_json::json!({ "type": "login", "userId": principal }));

        let body = match send_for_body(&transport, STEP, request).await {
            Ok(body) => body,
            Err(error) if error.is_timeout() => {
                info!("push notification timed out");
                return Ok(ApprovalOutcome::Failed(AuthFailure::new(
                    "Timeout",
                    "the notification service did not respond in time",
                )));
            }
            Err(error) => return Err(AuthError::Transport(error)),
        };

        let parsed: NotificationResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::parse(STEP, format!("invalid notification response: {e}")))?;
        Ok(interpret_notification(parsed))
    }

    /// Exchanges an approved trial for a session credential.
    ///
    /// The trial is consumed; a rejected or expired trial yields
    /// [`AuthOutcome::Failed`] and a new approval must be requested.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SessionAuthenticator::login`](super::SessionAuthenticator::login).
    #[instrument(skip(self, trial))]
    pub async fn complete_login(&self, principal: &str, trial: Trial) -> Result<AuthOutcome, AuthError> {
        let transport = Transport::new(self.timeouts).map_err(AuthError::Transport)?;
        let result: Result<Credential, StepError> = async {
            push_login(&transport, &self.endpoints, principal, &trial).await?;
            bridge_to_lms(&transport, &self.endpoints).await
        }
        .await;
        settle(result)
    }
}

async fn send_for_body(
    transport: &Transport,
    step: &str,
    request: reqwest::RequestBuilder,
) -> Result<String, crate::transport::TransportError> {
    let response = transport.send(step, request).await?;
    if !response.status().is_success() {
        return Err(crate::transport::TransportError::http_status(
            step,
            response.url().as_str(),
            response.status().as_u16(),
        ));
    }
    Transport::text(step, response).await
}

fn interpret_notification(response: NotificationResponse) -> ApprovalOutcome {
    if !response.success {
        let code = match response.code {
            Value::String(code) => code,
            Value::Null => "-".to_string(),
            other => other.to_string(),
        };
        return ApprovalOutcome::Failed(AuthFailure::new(code, response.msg));
    }
    match response.data {
        Some(NotificationData {
            success: true,
            tr_id: Some(tr_id),
        }) if !tr_id.is_empty() => {
            debug!("push notification delivered");
            ApprovalOutcome::Sent(Trial::new(tr_id))
        }
        _ => ApprovalOutcome::Failed(AuthFailure::new("-", "failed to send login notification")),
    }
}

async fn push_login(
    transport: &Transport,
    endpoints: &ServiceEndpoints,
    principal: &str,
    trial: &Trial,
) -> Result<(), StepError> {
    const STEP: &str = "push-login";
    let url = format!("{}/authentication/raonuaf/loginProcess", endpoints.sso);
    let request = transport.post(&url).form(&[
        ("agentId", PUSH_AGENT_ID),
        ("siteId", PUSH_SITE_ID),
        ("svcId", PUSH_SERVICE_ID),
        ("svcTrId", trial.as_str()),
        ("loginId", principal),
    ]);
    let response = transport.send(STEP, request).await?;
    let response = Transport::expect_status(STEP, response, StatusCode::OK)?;
    let body = Transport::text(STEP, response).await?;
    check_identity_result(STEP, &body)?;
    debug!(step = STEP, "push approval accepted");
    Ok(())
}
