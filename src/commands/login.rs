//! Interactive sign-in: password from the environment, or push approval.

use std::io;

use anyhow::{Context, Result, bail};
use lecture_core::{ApprovalOutcome, AuthMethod, AuthOutcome, Credential, LectureService};
use tracing::{debug, info};

use crate::cli::Args;

/// Environment variable holding the account password.
pub const PASSWORD_ENV: &str = "LECTURE_DL_PASSWORD";

/// Signs in with the method selected on the command line.
pub async fn sign_in(service: &LectureService, args: &Args) -> Result<Credential> {
    let principal = args
        .user
        .as_deref()
        .filter(|user| !user.trim().is_empty())
        .context("no user given: pass --user or set LECTURE_DL_USER")?;

    let method = if args.push {
        push_method(service, principal).await?
    } else {
        let secret = std::env::var(PASSWORD_ENV)
            .with_context(|| format!("password sign-in needs {PASSWORD_ENV} (or use --push)"))?;
        AuthMethod::Password(secret)
    };

    match service.authenticate(principal, method).await? {
        AuthOutcome::Authenticated(credential) => {
            info!("signed in");
            Ok(credential)
        }
        AuthOutcome::Failed(failure) => bail!("sign-in failed: {failure}"),
    }
}

async fn push_method(service: &LectureService, principal: &str) -> Result<AuthMethod> {
    match service.send_push(principal).await? {
        ApprovalOutcome::Sent(trial) => {
            debug!("push approval sent");
            eprintln!("Approve the sign-in request on your device, then press Enter.");
            wait_for_enter().await?;
            Ok(AuthMethod::Push(trial))
        }
        ApprovalOutcome::Failed(failure) => bail!("push request failed: {failure}"),
    }
}

async fn wait_for_enter() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().read_line(&mut line).map(|_| ())
    })
    .await
    .context("stdin reader stopped")?
    .context("failed to read from stdin")
}
