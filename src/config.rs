//! Configuration types for patient-risk

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "KSENSE_API_KEY";
/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "KSENSE_BASE_URL";
/// Environment variable overriding the page size
pub const PAGE_SIZE_ENV: &str = "KSENSE_PAGE_SIZE";

/// Upstream API connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, without trailing resource path (default: "https://assessment.ksensetech.com/api")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static key sent in the `x-api-key` header
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_ms_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            request_timeout: default_request_timeout(),
        }
    }
}

// Keeps the key out of logs
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Request-level retry policy with linear backoff
///
/// The delay before retry `i` (0-based) is `base_delay * (i + 1)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit (default: 500 ms)
    #[serde(default = "default_base_delay", with = "duration_ms_serde")]
    pub base_delay: Duration,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            jitter: false,
        }
    }
}

/// Page-level policy for the pagination loop
///
/// This sits on top of [`RetryConfig`]: once a page request has exhausted its
/// request-level attempts on a transient status, the loop waits `page_retry_delay`
/// and asks for the same page again, at most `max_page_retries` times.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records requested per page (default: 5)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Fixed wait before re-requesting a page (default: 1 second)
    #[serde(default = "default_page_retry_delay", with = "duration_ms_serde")]
    pub page_retry_delay: Duration,

    /// Re-requests of one page before giving up and keeping partial data (default: 3)
    #[serde(default = "default_max_page_retries")]
    pub max_page_retries: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_retry_delay: default_page_retry_delay(),
            max_page_retries: default_max_page_retries(),
        }
    }
}

/// Submission behavior
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Wrap the POST in the request-level retry policy (default: false, fire once)
    #[serde(default)]
    pub retry: bool,
}

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// API endpoint and credentials
    #[serde(default)]
    pub api: ApiConfig,

    /// Request-level retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Pagination loop settings
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Submission settings
    #[serde(default)]
    pub submission: SubmissionConfig,
}

impl Config {
    /// Build a configuration from process environment variables
    ///
    /// Required:
    /// - `KSENSE_API_KEY` - API key
    ///
    /// Optional:
    /// - `KSENSE_BASE_URL` - base URL override
    /// - `KSENSE_PAGE_SIZE` - records per page
    ///
    /// Callers that want `.env` support load it first (`dotenvy::dotenv()`).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            Error::config(format!("{API_KEY_ENV} not set in environment"), "api.api_key")
        })?;

        let mut config = Config {
            api: ApiConfig {
                api_key,
                ..Default::default()
            },
            ..Default::default()
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.api.base_url = base_url;
        }

        if let Ok(raw) = std::env::var(PAGE_SIZE_ENV) {
            config.pagination.page_size = raw.trim().parse().map_err(|_| {
                Error::config(
                    format!("{PAGE_SIZE_ENV} must be a positive integer, got '{raw}'"),
                    "pagination.page_size",
                )
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every request fail or loop forever
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            return Err(Error::config("API key must not be empty", "api.api_key"));
        }
        url::Url::parse(&self.api.base_url).map_err(|e| {
            Error::config(
                format!("invalid base URL '{}': {e}", self.api.base_url),
                "api.base_url",
            )
        })?;
        if self.pagination.page_size == 0 {
            return Err(Error::config(
                "page size must be at least 1",
                "pagination.page_size",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "max_attempts must be at least 1",
                "retry.max_attempts",
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://assessment.ksensetech.com/api".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_page_size() -> u32 {
    5
}

fn default_page_retry_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_page_retries() -> u32 {
    3
}

// Duration serialization helper (integer milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
