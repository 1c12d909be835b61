//! Error formatting utilities
//!
//! Renders errors for the terminal and for structured log fields.

use crate::Error;
use std::error::Error as StdError;

/// Format error for display
///
/// Adds an actionable hint for authentication failures and appends nested
/// causes that are not already part of the message.
pub fn format_error(error: &Error) -> String {
    let formatted = match error {
        Error::AuthRequired { reason } => {
            format!("Not logged in ({}). Run `rivian-telemetry login` first", reason)
        }

        Error::Auth { reason, operation } => match operation {
            Some(op) => format!(
                "Authentication failed during {}: {}. Check RIVIAN_USERNAME and RIVIAN_PASSWORD",
                op, reason
            ),
            None => format!(
                "Authentication failed: {}. Check RIVIAN_USERNAME and RIVIAN_PASSWORD",
                reason
            ),
        },

        Error::Fetch { operation, reason } => {
            format!("{} failed: {}", operation, reason)
        }

        Error::Config { field, message } => {
            format!("Configuration error in {}: {}", field, message)
        }

        Error::Network { message, status } => match status {
            Some(code) => format!("Network error (HTTP {}): {}", code, message),
            None => format!("Network error: {}", message),
        },

        Error::Validation {
            field,
            message,
            value,
        } => match value {
            Some(val) => format!(
                "Validation failed for {} (value: '{}'): {}",
                field, val, message
            ),
            None => format!("Validation failed for {}: {}", field, message),
        },

        _ => error.to_string(),
    };

    let mut result = formatted;
    let mut source = error.source();

    while let Some(cause) = source {
        if !result.contains(&cause.to_string()) {
            result = format!("{} (caused by {})", result, cause);
        }
        source = cause.source();
    }

    result
}

/// Format error for logging with structured data
pub fn format_error_for_logging(error: &Error) -> serde_json::Value {
    let mut log_data = serde_json::json!({
        "message": format_error(error),
        "category": error.category(),
        "retryable": error.is_retryable(),
    });

    match error {
        Error::Fetch { operation, .. } => {
            log_data["operation"] = serde_json::Value::String(operation.clone());
        }
        Error::Auth {
            operation: Some(op),
            ..
        } => {
            log_data["operation"] = serde_json::Value::String(op.clone());
        }
        Error::Network {
            status: Some(code), ..
        } => {
            log_data["status"] = serde_json::Value::Number((*code).into());
        }
        _ => {}
    }

    log_data
}
