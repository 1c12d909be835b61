//! Error taxonomy
//!
//! Classifies failures by how the caller is expected to react: authentication
//! problems end the run, CSRF bootstrap and fetch problems are retried.

use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable session was found; the user has to log in first
    #[error("Not logged in: {reason}")]
    AuthRequired {
        /// Why no session could be used
        reason: String,
    },

    /// Bad credentials, OTP mismatch or a rejected login payload
    #[error("Authentication failed: {reason}")]
    Auth {
        /// The reason why authentication failed
        reason: String,
        /// The GraphQL operation that was attempted
        operation: Option<String>,
    },

    /// A single CSRF/app-session bootstrap attempt failed
    #[error("CSRF bootstrap failed: {reason}")]
    CsrfBootstrap {
        /// The reason why the bootstrap failed
        reason: String,
    },

    /// A telemetry fetch failed (network, HTTP status, malformed body)
    #[error("Fetch of {operation} failed: {reason}")]
    Fetch {
        /// The GraphQL operation that was attempted
        operation: String,
        /// The reason why the fetch failed
        reason: String,
    },

    /// Configuration errors
    #[error("Configuration error in {field}: {message}")]
    Config {
        /// The configuration field that has an error
        field: String,
        /// Error message describing the issue
        message: String,
    },

    /// Network/connection errors
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
        /// HTTP status returned by the gateway, if any
        status: Option<u16>,
    },

    /// Validation errors
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Error message describing the validation failure
        message: String,
        /// The invalid value that caused the validation to fail
        value: Option<String>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal issue
        message: String,
        /// Additional context about where the error occurred
        context: Option<String>,
    },

    /// Date/time parsing errors
    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// Cancellation was requested while waiting to retry
    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an auth-required error
    pub fn auth_required<S: Into<String>>(reason: S) -> Self {
        Self::AuthRequired {
            reason: reason.into(),
        }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(reason: S) -> Self {
        Self::Auth {
            reason: reason.into(),
            operation: None,
        }
    }

    /// Create an authentication error for a specific operation
    pub fn auth_in<S: Into<String>>(operation: S, reason: S) -> Self {
        Self::Auth {
            reason: reason.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create a CSRF bootstrap error
    pub fn csrf_bootstrap<S: Into<String>>(reason: S) -> Self {
        Self::CsrfBootstrap {
            reason: reason.into(),
        }
    }

    /// Create a fetch error
    pub fn fetch<S: Into<String>>(operation: S, reason: S) -> Self {
        Self::Fetch {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(field: S, message: S) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Create a network error carrying the HTTP status
    pub fn network_status<S: Into<String>>(message: S, status: u16) -> Self {
        Self::Network {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Fetch { .. } => true,
            Error::CsrfBootstrap { .. } => true,
            Error::Network { status, .. } => !matches!(status, Some(401) | Some(403)),
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Whether the operation stopped because cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Whether the failure requires the user to authenticate again
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::AuthRequired { .. } | Error::Auth { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Http(..) => "http",
            Error::Json(..) => "json",
            Error::Toml(..) => "toml",
            Error::Url(..) => "url",
            Error::Io(..) => "io",
            Error::AuthRequired { .. } => "auth_required",
            Error::Auth { .. } => "auth",
            Error::CsrfBootstrap { .. } => "csrf_bootstrap",
            Error::Fetch { .. } => "fetch",
            Error::Config { .. } => "config",
            Error::Network { .. } => "network",
            Error::Validation { .. } => "validation",
            Error::Internal { .. } => "internal",
            Error::DateParse(..) => "date_parse",
            Error::Cancelled => "cancelled",
        }
    }
}
