//! Login, OTP completion and CSRF bootstrap
//!
//! Every gateway call needs the per-process CSRF/app-session pair, so the
//! pair is bootstrapped lazily on first use and cached for the lifetime of
//! the client.

use crate::{
    Result,
    config::Settings,
    poll::scheduler::{Scheduler, SleepOutcome, TokioScheduler},
    session::network::NetworkManager,
    types::{CsrfTokens, GraphQlRequest, HeaderSet, LoginOutcome, OtpChallenge, Session, graphql},
};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::{OnceCell, watch::Receiver};
use tracing::{debug, info, warn};

const CREATE_CSRF_TOKEN: &str =
    "mutation CreateCSRFToken {createCsrfToken {__typename csrfToken appSessionToken}}";

const LOGIN: &str = "mutation Login($email: String!, $password: String!) {
  login(email: $email, password: $password) {
    __typename
    ... on MobileLoginResponse {
      __typename
      accessToken
      refreshToken
      userSessionToken
    }
    ... on MobileMFALoginResponse {
      __typename
      otpToken
    }
  }
}";

const LOGIN_WITH_OTP: &str =
    "mutation LoginWithOTP($email: String!, $otpCode: String!, $otpToken: String!) {
  loginWithOTP(email: $email, otpCode: $otpCode, otpToken: $otpToken) {
    __typename
    ... on MobileLoginResponse {
      __typename
      accessToken
      refreshToken
      userSessionToken
    }
  }
}";

/// Client for the authentication operations of the gateway
#[derive(Debug)]
pub struct AuthClient {
    network: NetworkManager,
    csrf_retry_interval: Duration,
    retry_scheduler: TokioScheduler,
    csrf: OnceCell<CsrfTokens>,
}

impl AuthClient {
    /// Create an auth client from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_network(
            NetworkManager::new(settings)?,
            settings.auth.csrf_retry_interval,
        ))
    }

    /// Create an auth client on top of an existing transport
    pub fn with_network(network: NetworkManager, csrf_retry_interval: Duration) -> Self {
        // Without a sender the retry wait can never be cancelled
        let (retry_scheduler, _) = TokioScheduler::new();
        Self {
            network,
            csrf_retry_interval,
            retry_scheduler,
            csrf: OnceCell::new(),
        }
    }

    /// Abort the CSRF retry wait once `cancel_rx` turns true
    pub fn with_cancellation(mut self, cancel_rx: Receiver<bool>) -> Self {
        self.retry_scheduler = TokioScheduler::with_receiver(cancel_rx);
        self
    }

    /// Underlying transport
    pub fn network(&self) -> &NetworkManager {
        &self.network
    }

    /// Headers every request starts from
    pub fn base_headers(&self) -> HeaderSet {
        self.network.base_headers()
    }

    /// One `CreateCSRFToken` attempt
    pub async fn create_csrf_token(&self) -> Result<CsrfTokens> {
        let request = GraphQlRequest::new("CreateCSRFToken", CREATE_CSRF_TOKEN);
        let body = self
            .network
            .post(&request, &self.base_headers())
            .await
            .map_err(|e| crate::Error::csrf_bootstrap(e.to_string()))?;

        let payload = graphql::data_field(&body, "createCsrfToken").ok_or_else(|| {
            let errors = graphql::response_errors(&body);
            crate::Error::csrf_bootstrap(if errors.is_empty() {
                "response has no createCsrfToken payload".to_string()
            } else {
                graphql::describe_errors(&errors)
            })
        })?;

        serde_json::from_value(payload.clone())
            .map_err(|e| crate::Error::csrf_bootstrap(format!("malformed payload: {}", e)))
    }

    /// Bootstrap the CSRF/app-session pair, retrying until it succeeds
    ///
    /// Only cancellation ends the retries early, with [`crate::Error::Cancelled`].
    pub async fn bootstrap_csrf(&self) -> Result<CsrfTokens> {
        let mut attempt: u32 = 1;
        loop {
            match self.create_csrf_token().await {
                Ok(tokens) => {
                    debug!(attempt, "CSRF bootstrap succeeded");
                    return Ok(tokens);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        retry_in = ?self.csrf_retry_interval,
                        "CSRF bootstrap failed: {}",
                        e
                    );
                    if self.retry_scheduler.sleep(self.csrf_retry_interval).await
                        == SleepOutcome::Cancelled
                    {
                        info!(attempt, "CSRF bootstrap cancelled");
                        return Err(crate::Error::Cancelled);
                    }
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// The cached CSRF/app-session pair, bootstrapped on first use
    pub async fn csrf_tokens(&self) -> Result<&CsrfTokens> {
        self.csrf.get_or_try_init(|| self.bootstrap_csrf()).await
    }

    /// Headers for pre-login operations
    async fn login_headers(&self) -> Result<HeaderSet> {
        let tokens = self.csrf_tokens().await?;
        let mut headers = self.base_headers();
        headers.insert("Csrf-Token".to_string(), tokens.csrf_token.clone());
        headers.insert("A-Sess".to_string(), tokens.app_session_token.clone());
        headers.insert("Dc-Cid".to_string(), device_client_id());
        Ok(headers)
    }

    /// Password step of a login
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let request = GraphQlRequest::new("Login", LOGIN)
            .with_variables(json!({ "email": username, "password": password }));
        let headers = self.login_headers().await?;
        let body = self
            .network
            .post(&request, &headers)
            .await
            .map_err(|e| rejected_login("Login", e))?;

        let payload = login_payload(&body, "Login", "login")?;
        if let Some(otp_token) = payload.get("otpToken").and_then(Value::as_str) {
            info!("Login requires a one-time passcode");
            return Ok(LoginOutcome::OtpRequired(OtpChallenge {
                username: username.to_string(),
                otp_token: otp_token.to_string(),
            }));
        }

        let session = session_from_payload("Login", payload)?;
        info!("Login succeeded");
        Ok(LoginOutcome::Authenticated(session))
    }

    /// OTP step of a login
    pub async fn complete_otp(&self, challenge: &OtpChallenge, otp_code: &str) -> Result<Session> {
        let request = GraphQlRequest::new("LoginWithOTP", LOGIN_WITH_OTP).with_variables(json!({
            "email": challenge.username,
            "otpCode": otp_code.trim(),
            "otpToken": challenge.otp_token,
        }));
        let headers = self.login_headers().await?;
        let body = self
            .network
            .post(&request, &headers)
            .await
            .map_err(|e| rejected_login("LoginWithOTP", e))?;

        let payload = login_payload(&body, "LoginWithOTP", "loginWithOTP")?;
        let session = session_from_payload("LoginWithOTP", payload)?;
        info!("OTP login succeeded");
        Ok(session)
    }

    /// Headers for an authenticated call; a new `Dc-Cid` is generated each time
    pub async fn authorized_headers(&self, session: &Session) -> Result<HeaderSet> {
        let tokens = self.csrf_tokens().await?;
        let mut headers = self.base_headers();
        headers.insert("Csrf-Token".to_string(), tokens.csrf_token.clone());
        headers.insert("A-Sess".to_string(), tokens.app_session_token.clone());
        headers.insert("U-Sess".to_string(), session.user_session_token.clone());
        headers.insert("Dc-Cid".to_string(), device_client_id());
        Ok(headers)
    }
}

/// Per-request device/client id
fn device_client_id() -> String {
    format!("m-ios-{}", uuid::Uuid::new_v4())
}

// Client-side HTTP statuses mean the gateway refused the credentials
fn rejected_login(operation: &str, err: crate::Error) -> crate::Error {
    match err {
        crate::Error::Network {
            message,
            status: Some(status),
        } if (400..500).contains(&status) => crate::Error::auth_in(operation.to_string(), message),
        other => other,
    }
}

fn login_payload<'a>(body: &'a Value, operation: &str, field: &str) -> Result<&'a Value> {
    graphql::data_field(body, field).ok_or_else(|| {
        let errors = graphql::response_errors(body);
        let reason = if errors.is_empty() {
            format!("response has no {} payload", field)
        } else {
            graphql::describe_errors(&errors)
        };
        crate::Error::auth_in(operation.to_string(), reason)
    })
}

fn session_from_payload(operation: &str, payload: &Value) -> Result<Session> {
    serde_json::from_value(payload.clone()).map_err(|e| {
        crate::Error::auth_in(operation.to_string(), format!("incomplete token payload: {}", e))
    })
}
