//! Network configuration and the GraphQL transport
//!
//! This module owns the HTTP client (proxy, TLS, timeouts) and the single
//! `post_query` primitive every remote operation goes through.

use crate::{
    Result,
    config::Settings,
    types::{GraphQlRequest, HeaderSet, graphql},
};
use reqwest::{Client, Proxy};
use serde_json::Value;
use tracing::{debug, trace};

/// Proxy settings for outbound requests
#[derive(Debug, Clone, Default)]
pub struct ProxySpec {
    /// Proxy URL
    pub proxy_url: Option<String>,
    /// Disable TLS verification
    pub disable_tls_verification: bool,
}

impl ProxySpec {
    /// Derive the proxy settings from the loaded configuration
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            proxy_url: settings.get_proxy_url(),
            disable_tls_verification: settings.network.disable_tls_verification,
        }
    }
}

/// HTTP transport for the GraphQL gateway
#[derive(Debug, Clone)]
pub struct NetworkManager {
    /// Base HTTP client
    client: Client,
    /// Gateway endpoint
    endpoint: String,
    /// Headers sent with every request
    base_headers: HeaderSet,
}

impl NetworkManager {
    /// Create a network manager from settings
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_proxy_spec(settings, &ProxySpec::from_settings(settings))
    }

    /// Create a network manager with an explicit proxy configuration
    pub fn with_proxy_spec(settings: &Settings, proxy_spec: &ProxySpec) -> Result<Self> {
        let mut client_builder = Client::builder()
            .user_agent(settings.api.user_agent.clone())
            .timeout(settings.api.request_timeout)
            .connect_timeout(settings.api.connect_timeout);

        if let Some(proxy_url) = &proxy_spec.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                crate::Error::config("proxy", &format!("Invalid proxy URL '{}': {}", proxy_url, e))
            })?;
            client_builder = client_builder.proxy(proxy);
        }

        if proxy_spec.disable_tls_verification {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            crate::Error::internal(format!("Failed to create HTTP client: {}", e))
        })?;

        let mut base_headers = HeaderSet::new();
        base_headers.insert("User-Agent".to_string(), settings.api.user_agent.clone());
        base_headers.insert("Accept".to_string(), "application/json".to_string());
        base_headers.insert("Content-Type".to_string(), "application/json".to_string());
        base_headers.insert(
            "Apollographql-Client-Name".to_string(),
            settings.api.client_name.clone(),
        );

        Ok(Self {
            client,
            endpoint: settings.api.gateway_url.clone(),
            base_headers,
        })
    }

    /// Get the configured HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Gateway endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Copy of the headers every request starts from
    pub fn base_headers(&self) -> HeaderSet {
        self.base_headers.clone()
    }

    /// POST an operation document to the configured gateway
    pub async fn post(&self, document: &GraphQlRequest, headers: &HeaderSet) -> Result<Value> {
        self.post_query(&self.endpoint, document, headers).await
    }

    /// POST an operation document and return the JSON body
    ///
    /// Non-2xx statuses become [`crate::Error::Network`] carrying the status;
    /// GraphQL-level `errors` are left for the caller to interpret.
    pub async fn post_query(
        &self,
        endpoint: &str,
        document: &GraphQlRequest,
        headers: &HeaderSet,
    ) -> Result<Value> {
        debug!(operation = %document.operation_name, "Posting GraphQL operation");

        let mut request = self.client.post(endpoint).json(document);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| {
            crate::Error::network(format!(
                "{} request failed: {}",
                document.operation_name, e
            ))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            crate::Error::network(format!(
                "Failed to read {} response: {}",
                document.operation_name, e
            ))
        })?;
        trace!(operation = %document.operation_name, %status, body = %text, "Gateway response");

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .map(|body| graphql::describe_errors(&graphql::response_errors(&body)))
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(crate::Error::network_status(
                format!("{} returned {}: {}", document.operation_name, status, detail),
                status.as_u16(),
            ));
        }

        Ok(serde_json::from_str(&text)?)
    }
}
