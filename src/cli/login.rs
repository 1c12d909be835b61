//! Login command
//!
//! Runs the password step, the OTP step when the account requires it, and
//! persists the resulting session.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::{
    cli::{init_logging, load_settings},
    error::format_error,
    session::{AuthClient, SessionStore},
    types::{LoginOutcome, Session},
};

/// Arguments for the login command
#[derive(Debug)]
pub struct LoginArgs {
    pub config: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub otp: Option<String>,
    pub verbose: bool,
}

/// Run the login command
pub async fn run_login_mode(args: LoginArgs) -> Result<()> {
    let settings = load_settings(args.config)?;
    init_logging(args.verbose, &settings);

    let username = args
        .username
        .context("No username given. Pass --username or set RIVIAN_USERNAME")?;
    let password = args
        .password
        .context("No password given. Pass --password or set RIVIAN_PASSWORD")?;

    let store = SessionStore::from_settings(&settings).map_err(|e| anyhow::anyhow!(format_error(&e)))?;
    let auth = AuthClient::new(&settings).map_err(|e| anyhow::anyhow!(format_error(&e)))?;

    debug!(username = %username, "Logging in");
    let session = login(&auth, &username, &password, args.otp).await?;

    store
        .save(&session)
        .await
        .map_err(|e| anyhow::anyhow!(format_error(&e)))?;
    info!("Login complete");
    println!("Logged in. Session saved to {}", store.path().display());
    Ok(())
}

async fn login(
    auth: &AuthClient,
    username: &str,
    password: &str,
    otp: Option<String>,
) -> Result<Session> {
    let outcome = auth
        .login(username, password)
        .await
        .map_err(|e| anyhow::anyhow!(format_error(&e)))?;

    match outcome {
        LoginOutcome::Authenticated(session) => Ok(session),
        LoginOutcome::OtpRequired(challenge) => {
            let code = match otp {
                Some(code) => code,
                None => prompt_otp().await?,
            };
            auth.complete_otp(&challenge, &code)
                .await
                .map_err(|e| anyhow::anyhow!(format_error(&e)))
        }
    }
}

async fn prompt_otp() -> Result<String> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(b"Enter the one-time passcode: ").await?;
    stderr.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read the one-time passcode")?;

    let code = line.trim().to_string();
    if code.is_empty() {
        anyhow::bail!("No one-time passcode entered");
    }
    Ok(code)
}
