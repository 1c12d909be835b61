//! Credential types
//!
//! The long-lived token triple is the only thing ever written to disk; the
//! CSRF/app-session pair is bootstrapped per process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Header name/value pairs attached to a gateway request
pub type HeaderSet = HashMap<String, String>;

/// Separator used when the token triple is supplied through the environment
pub const SESSION_DELIMITER: char = ':';

/// Long-lived login tokens
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "userSessionToken")]
    pub user_session_token: String,
}

impl Session {
    /// Create a session from its three tokens
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user_session_token: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user_session_token: user_session_token.into(),
        }
    }

    /// Parse `access:refresh:user_session`
    pub fn from_delimited(value: &str) -> crate::Result<Self> {
        let parts: Vec<&str> = value.trim().split(SESSION_DELIMITER).collect();
        match parts.as_slice() {
            [access, refresh, user_session]
                if !access.is_empty() && !refresh.is_empty() && !user_session.is_empty() =>
            {
                Ok(Self::new(*access, *refresh, *user_session))
            }
            _ => Err(crate::Error::Validation {
                field: "session".to_string(),
                message: format!(
                    "expected three non-empty tokens separated by '{}', got {} part(s)",
                    SESSION_DELIMITER,
                    parts.len()
                ),
                value: None,
            }),
        }
    }
}

// Tokens never end up in logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user_session_token", &"<redacted>")
            .finish()
    }
}

/// Anti-forgery pair returned by the CSRF bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CsrfTokens {
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
    #[serde(rename = "appSessionToken")]
    pub app_session_token: String,
}

impl CsrfTokens {
    pub fn new(csrf_token: impl Into<String>, app_session_token: impl Into<String>) -> Self {
        Self {
            csrf_token: csrf_token.into(),
            app_session_token: app_session_token.into(),
        }
    }
}

/// Pending multi-factor login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    /// Account the OTP code belongs to
    pub username: String,
    /// Opaque token tying the OTP code to the password step
    pub otp_token: String,
}

/// Result of the password step of a login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Tokens were issued directly
    Authenticated(Session),
    /// The remote wants a one-time code before issuing tokens
    OtpRequired(OtpChallenge),
}
