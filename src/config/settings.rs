//! Configuration settings
//!
//! Settings are layered from defaults, a TOML file, environment variables
//! and finally command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default GraphQL gateway of the telemetry service
pub const DEFAULT_GATEWAY_URL: &str = "https://rivian.com/api/gql/gateway/graphql";

// Helper functions for serde defaults
fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_user_agent() -> String {
    "RivianApp/1304 CFNetwork/1404.0.5 Darwin/22.3.0".to_string()
}

fn default_client_name() -> String {
    "com.rivian.ios.consumer-apollo-ios".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_csrf_retry_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_sleep_wait() -> Duration {
    Duration::from_secs(40 * 60)
}

fn default_log_level() -> String {
    "info".to_string()
}

// Duration serialization module
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Main configuration settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Remote gateway configuration
    #[serde(default)]
    pub api: ApiSettings,
    /// Session persistence and bootstrap configuration
    #[serde(default)]
    pub auth: AuthSettings,
    /// Polling engine configuration
    #[serde(default)]
    pub polling: PollingSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Network and proxy configuration
    #[serde(default)]
    pub network: NetworkSettings,
}

/// Remote GraphQL gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Gateway endpoint receiving every operation
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Value of the Apollographql-Client-Name header
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Whole-request timeout
    #[serde(with = "duration_secs", default = "default_request_timeout")]
    pub request_timeout: Duration,
    /// Connection establishment timeout
    #[serde(with = "duration_secs", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Session file location; defaults to the platform config directory
    #[serde(default)]
    pub session_file: Option<PathBuf>,
    /// Fixed delay between CSRF bootstrap attempts
    #[serde(with = "duration_secs", default = "default_csrf_retry_interval")]
    pub csrf_retry_interval: Duration,
}

/// Polling engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Vehicle to poll
    #[serde(default)]
    pub vehicle_id: Option<String>,
    /// Delay between regular polls
    #[serde(with = "duration_secs", default = "default_poll_interval")]
    pub poll_interval: Duration,
    /// Idle time without changes before a long sleep; zero disables
    #[serde(with = "duration_secs", default)]
    pub inactivity_wait: Duration,
    /// Length of the long sleep that lets the vehicle doze off
    #[serde(with = "duration_secs", default = "default_sleep_wait")]
    pub sleep_wait: Duration,
    /// Print every sample instead of changes only
    #[serde(default)]
    pub show_all_samples: bool,
    /// Metric units instead of imperial
    #[serde(default)]
    pub metric: bool,
    /// Suppress location columns
    #[serde(default)]
    pub privacy: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

/// Network and proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkSettings {
    /// HTTPS proxy URL
    #[serde(default)]
    pub https_proxy: Option<String>,
    /// HTTP proxy URL
    #[serde(default)]
    pub http_proxy: Option<String>,
    /// All protocols proxy URL
    #[serde(default)]
    pub all_proxy: Option<String>,
    /// Disable TLS certificate verification
    #[serde(default)]
    pub disable_tls_verification: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            user_agent: default_user_agent(),
            client_name: default_client_name(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_file: None,
            csrf_retry_interval: default_csrf_retry_interval(),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            vehicle_id: None,
            poll_interval: default_poll_interval(),
            inactivity_wait: Duration::ZERO,
            sleep_wait: default_sleep_wait(),
            show_all_samples: false,
            metric: false,
            privacy: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            verbose: false,
        }
    }
}

fn parse_secs(var: &str, value: &str) -> crate::Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| crate::Error::config(var, &format!("Invalid number of seconds: {}", e)))
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::default().merge_with_env()
    }

    /// Load settings from configuration file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config("file", &format!("Failed to read config file: {}", e))
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| {
            crate::Error::config("file", &format!("Failed to parse config file: {}", e))
        })?;

        Ok(settings)
    }

    /// Apply environment variable overrides on top of these settings
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        if let Ok(url) = std::env::var("RIVIAN_GATEWAY_URL") {
            self.api.gateway_url = url;
        }

        if let Ok(path) = std::env::var("RIVIAN_SESSION_FILE") {
            self.auth.session_file = Some(PathBuf::from(path));
        }

        if let Ok(vehicle_id) = std::env::var("RIVIAN_VEHICLE_ID") {
            self.polling.vehicle_id = Some(vehicle_id);
        }

        if let Ok(value) = std::env::var("RIVIAN_POLL_INTERVAL") {
            self.polling.poll_interval = parse_secs("RIVIAN_POLL_INTERVAL", &value)?;
        }

        if let Ok(value) = std::env::var("RIVIAN_INACTIVITY_WAIT") {
            self.polling.inactivity_wait = parse_secs("RIVIAN_INACTIVITY_WAIT", &value)?;
        }

        if let Ok(value) = std::env::var("RIVIAN_SLEEP_WAIT") {
            self.polling.sleep_wait = parse_secs("RIVIAN_SLEEP_WAIT", &value)?;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(verbose) = std::env::var("VERBOSE") {
            self.logging.verbose = verbose.parse().unwrap_or(false);
        }

        // Proxy variables always override when present
        if let Ok(proxy) = std::env::var("HTTPS_PROXY") {
            self.network.https_proxy = Some(proxy);
        }
        if let Ok(proxy) = std::env::var("HTTP_PROXY") {
            self.network.http_proxy = Some(proxy);
        }
        if let Ok(proxy) = std::env::var("ALL_PROXY") {
            self.network.all_proxy = Some(proxy);
        }

        Ok(self)
    }

    /// Get effective proxy URL based on priority
    pub fn get_proxy_url(&self) -> Option<String> {
        self.network
            .https_proxy
            .as_ref()
            .or(self.network.http_proxy.as_ref())
            .or(self.network.all_proxy.as_ref())
            .cloned()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        url::Url::parse(&self.api.gateway_url).map_err(|e| {
            crate::Error::config(
                "gateway_url",
                &format!("Invalid gateway URL '{}': {}", self.api.gateway_url, e),
            )
        })?;

        if self.polling.poll_interval.is_zero() {
            return Err(crate::Error::config(
                "poll_interval",
                "Invalid poll interval: cannot be 0",
            ));
        }

        if !self.polling.inactivity_wait.is_zero() && self.polling.sleep_wait.is_zero() {
            return Err(crate::Error::config(
                "sleep_wait",
                "Sleep wait cannot be 0 while inactivity wait is enabled",
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(crate::Error::config(
                    "log_level",
                    &format!("Invalid log level: {}", self.logging.level),
                ));
            }
        }

        for (name, proxy_url) in [
            ("https_proxy", &self.network.https_proxy),
            ("http_proxy", &self.network.http_proxy),
            ("all_proxy", &self.network.all_proxy),
        ]
        .iter()
        {
            if let Some(url_str) = proxy_url
                && let Err(e) = url::Url::parse(url_str)
            {
                return Err(crate::Error::config(
                    *name,
                    &format!("Invalid proxy URL '{}': {}", url_str, e),
                ));
            }
        }

        Ok(())
    }
}
