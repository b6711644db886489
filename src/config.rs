//! Provider configuration.
//!
//! Connection settings come from the provider configuration block, with
//! environment variables filling in anything left unset:
//!
//! | Setting | Environment variable |
//! |---------|----------------------|
//! | `https_host` | `DIRCONFIG_PROVIDER_HTTPS_HOST` |
//! | `username` | `DIRCONFIG_PROVIDER_USERNAME` |
//! | `password` | `DIRCONFIG_PROVIDER_PASSWORD` |
//! | `insecure_trust_all_tls` | `DIRCONFIG_PROVIDER_INSECURE_TRUST_ALL_TLS` |

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::error::ProviderError;
use crate::schema::{AttributeSchema, Diagnostic};

/// Environment variable for the server URL.
pub const ENV_HTTPS_HOST: &str = "DIRCONFIG_PROVIDER_HTTPS_HOST";
/// Environment variable for the admin user.
pub const ENV_USERNAME: &str = "DIRCONFIG_PROVIDER_USERNAME";
/// Environment variable for the admin password.
pub const ENV_PASSWORD: &str = "DIRCONFIG_PROVIDER_PASSWORD";
/// Environment variable disabling certificate verification.
pub const ENV_INSECURE_TRUST_ALL_TLS: &str = "DIRCONFIG_PROVIDER_INSECURE_TRUST_ALL_TLS";

/// Attributes accepted in the provider configuration block.
pub const PROVIDER_CONFIG_ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema::string("https-host")
        .with_description("URL of the server's HTTPS interface, e.g. https://localhost:1443"),
    AttributeSchema::string("username").with_description("Administrative user"),
    AttributeSchema::string("password")
        .sensitive()
        .with_description("Password of the administrative user"),
    AttributeSchema::bool("insecure-trust-all-tls")
        .with_description("Accept any certificate presented by the server"),
    AttributeSchema::int("request-timeout-secs")
        .with_description("Timeout for a single configuration API request"),
    AttributeSchema::int("connect-timeout-secs")
        .with_description("Timeout for establishing a connection"),
    AttributeSchema::int("max-retries")
        .with_description("Retries for transient failures before giving up"),
    AttributeSchema::int("initial-backoff-ms").with_description("Delay before the first retry"),
    AttributeSchema::int("max-backoff-ms").with_description("Upper bound on the retry delay"),
];

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Bounded exponential backoff for configuration API calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }
        let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
        let delay = self.initial_backoff_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_backoff_ms))
    }

    /// Whether an HTTP status is transient and worth retrying.
    pub fn should_retry_status(&self, status: u16) -> bool {
        matches!(status, 429 | 502 | 503 | 504)
    }
}

/// Settings for reaching the configuration API.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the server.
    #[serde(default)]
    pub https_host: Option<String>,
    /// Administrative user.
    #[serde(default)]
    pub username: Option<String>,
    /// Password of the administrative user.
    #[serde(default)]
    pub password: Option<String>,
    /// Accept any server certificate.
    #[serde(default)]
    pub insecure_trust_all_tls: Option<bool>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Retry behavior for transient failures.
    #[serde(flatten)]
    pub retry: RetryPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            https_host: None,
            username: None,
            password: None,
            insecure_trust_all_tls: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            retry: RetryPolicy::default(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("https_host", &self.https_host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("insecure_trust_all_tls", &self.insecure_trust_all_tls)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ProviderConfig {
    /// Parse the provider configuration block and fill gaps from the process environment.
    pub fn from_value(config: &Value) -> Result<Self, ProviderError> {
        Self::from_value_with_env(config, |key| std::env::var(key).ok())
    }

    /// Parse the provider configuration block, filling gaps through `env`.
    pub fn from_value_with_env<F>(config: &Value, env: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed: Self = match config {
            Value::Null => Self::default(),
            other => serde_json::from_value(strip_nulls(other))?,
        };
        Ok(parsed.with_env_fallbacks(env))
    }

    fn with_env_fallbacks<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.https_host.is_none() {
            self.https_host = env(ENV_HTTPS_HOST);
        }
        if self.username.is_none() {
            self.username = env(ENV_USERNAME);
        }
        if self.password.is_none() {
            self.password = env(ENV_PASSWORD);
        }
        if self.insecure_trust_all_tls.is_none() {
            self.insecure_trust_all_tls =
                env(ENV_INSECURE_TRUST_ALL_TLS).map(|v| v.eq_ignore_ascii_case("true"));
        }
        self
    }

    /// Report missing or malformed settings.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        match self.https_host.as_deref() {
            None | Some("") => diagnostics.push(
                Diagnostic::error("Missing server URL")
                    .with_detail(format!("Set https_host or {}", ENV_HTTPS_HOST))
                    .with_attribute("https_host"),
            ),
            Some(host) if !(host.starts_with("https://") || host.starts_with("http://")) => {
                diagnostics.push(
                    Diagnostic::error("Invalid server URL")
                        .with_detail(format!("'{}' must start with https:// or http://", host))
                        .with_attribute("https_host"),
                )
            },
            Some(_) => {},
        }
        if self.username.as_deref().unwrap_or_default().is_empty() {
            diagnostics.push(
                Diagnostic::error("Missing username")
                    .with_detail(format!("Set username or {}", ENV_USERNAME))
                    .with_attribute("username"),
            );
        }
        if self.password.as_deref().unwrap_or_default().is_empty() {
            diagnostics.push(
                Diagnostic::error("Missing password")
                    .with_detail(format!("Set password or {}", ENV_PASSWORD))
                    .with_attribute("password"),
            );
        }
        if self.request_timeout_secs == 0 {
            diagnostics.push(
                Diagnostic::error("Request timeout must be positive")
                    .with_attribute("request_timeout_secs"),
            );
        }
        if self.insecure_trust_all_tls == Some(true) {
            diagnostics.push(
                Diagnostic::warning("Certificate verification is disabled")
                    .with_attribute("insecure_trust_all_tls"),
            );
        }
        diagnostics
    }

    /// Timeout for one request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Timeout for establishing a connection.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Drop `null` members so serde defaults apply to them.
fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}
