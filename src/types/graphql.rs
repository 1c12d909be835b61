//! GraphQL envelope types
//!
//! Every gateway call is a POST of an operation document; responses carry
//! `data` and/or `errors`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operation document posted to the gateway
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    #[serde(rename = "operationName")]
    pub operation_name: String,
    pub query: String,
    pub variables: Value,
}

impl GraphQlRequest {
    /// Create a new operation document
    pub fn new(operation_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            query: query.into(),
            variables: Value::Null,
        }
    }

    /// Set the operation variables
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }
}

/// One entry of the `errors` array
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlErrorExtensions {
    pub code: Option<String>,
}

impl GraphQlError {
    /// Error code from the extensions, if any
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref().and_then(|e| e.code.as_deref())
    }

    /// Whether the gateway rejected the session itself
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self.code(), Some("UNAUTHENTICATED"))
    }
}

/// Extract the `errors` array of a response body; malformed entries are skipped
pub fn response_errors(body: &Value) -> Vec<GraphQlError> {
    body.get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| serde_json::from_value(e.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Join error messages for display
pub fn describe_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| match e.code() {
            Some(code) => format!("{} ({})", e.message, code),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Navigate `data.<field>`, treating null as absent
pub fn data_field<'a>(body: &'a Value, field: &str) -> Option<&'a Value> {
    body.get("data")
        .and_then(|data| data.get(field))
        .filter(|value| !value.is_null())
}
