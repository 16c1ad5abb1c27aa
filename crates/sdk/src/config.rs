//! Configuration types for the Kit client.

use std::time::Duration;
use url::Url;

/// Default Kit v4 endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.kit.com/v4/";

/// Configuration for the Kit client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Kit API. Always ends with `/` so relative paths join
    /// below it.
    pub base_url: Url,
    /// API key, sent as `X-Kit-Api-Key`.
    pub api_key: Option<String>,
    /// OAuth access token, sent as a bearer token.
    pub access_token: Option<String>,
    /// Timeout applied to each individual request.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            api_key: None,
            access_token: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }

    /// Whether any credential is configured.
    pub fn has_credentials(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.api_key) || present(&self.access_token)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Configuration for retry behavior.
///
/// Delays come from the shared rate limiter's backoff so that retries and
/// admission waits use one schedule.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// HTTP status codes to retry on.
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_on_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_status() {
        let config = RetryConfig::default();

        assert!(config.should_retry_status(429));
        assert!(config.should_retry_status(500));
        assert!(config.should_retry_status(504));
        assert!(!config.should_retry_status(501));
        assert!(!config.should_retry_status(422));
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new(Url::parse(DEFAULT_BASE_URL).unwrap());

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry_config.max_retries, 3);
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::new(Url::parse("http://localhost:8080/v4").unwrap());
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/v4/");
    }

    #[test]
    fn test_blank_credentials_do_not_count() {
        let mut config = ClientConfig::new(Url::parse(DEFAULT_BASE_URL).unwrap());
        config.api_key = Some("  ".to_string());
        assert!(!config.has_credentials());

        config.access_token = Some("token".to_string());
        assert!(config.has_credentials());
    }

    #[test]
    fn test_retry_config_no_retry() {
        let config = RetryConfig::no_retry();

        assert_eq!(config.max_retries, 0);
        assert_eq!(config.retry_on_status_codes, vec![429, 500, 502, 503, 504]);
    }
}
